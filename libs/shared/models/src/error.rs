use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::validation::FieldErrors;

/// A hard delete refused because protected rows still point at the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteBlocked {
    pub entity: &'static str,
    pub id: i64,
    pub dependent: &'static str,
    pub count: usize,
}

impl fmt::Display for DeleteBlocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cannot delete this {}: it still has {} associated {}. Reassign or deactivate it instead.",
            self.entity, self.count, self.dependent
        )
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{0}")]
    DeleteBlocked(DeleteBlocked),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(entity: &str, id: i64) -> Self {
        AppError::NotFound(format!("{} {} does not exist", entity, id))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DeleteBlocked(_) => StatusCode::CONFLICT,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message suitable for end users. Server-side details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::NotFound(msg) | AppError::BadRequest(msg) | AppError::Conflict(msg) => {
                msg.clone()
            }
            AppError::ValidationError(_) => "Validation failed".to_string(),
            AppError::DeleteBlocked(blocked) => blocked.to_string(),
            AppError::Database(_) => "Database error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::ValidationError(errors)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!("Error: {}: {}", status, self);
        } else {
            tracing::warn!("Error: {}: {}", status, self);
        }

        let body = match &self {
            AppError::ValidationError(fields) => json!({
                "error": self.public_message(),
                "fields": fields,
            }),
            AppError::DeleteBlocked(blocked) => json!({
                "error": self.public_message(),
                "blocked_by": blocked.dependent,
                "dependents": blocked.count,
            }),
            _ => json!({
                "error": self.public_message()
            }),
        };

        (status, Json(body)).into_response()
    }
}
