pub mod laboratory;
pub mod medication;

pub use laboratory::LaboratoryService;
pub use medication::MedicationService;
