pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod views;

pub use router::{doctor_api, doctor_pages};
