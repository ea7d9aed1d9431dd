pub mod prescription;
pub mod treatment;

pub use prescription::PrescriptionService;
pub use treatment::TreatmentService;
