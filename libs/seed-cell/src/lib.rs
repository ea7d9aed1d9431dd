pub mod catalog;
pub mod generator;
pub mod seeder;

pub use generator::DemoDataGenerator;
pub use seeder::{clear_clinic_data, seed_database, SeedOptions, SeedSummary};
