pub mod professional;
pub mod specialty;

pub use professional::ProfessionalService;
pub use specialty::SpecialtyService;
