pub mod error;
pub mod pagination;
pub mod validation;

pub use error::{AppError, DeleteBlocked};
pub use pagination::Page;
pub use validation::FieldErrors;
