pub mod home;
pub mod router;

pub use router::create_router;
