pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod views;

pub use router::{patient_api, patient_pages};
