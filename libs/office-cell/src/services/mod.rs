pub mod office;

pub use office::OfficeService;
