pub mod consultation;
pub mod payment;

pub use consultation::ConsultationService;
pub use payment::PaymentService;
