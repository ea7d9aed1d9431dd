use std::sync::LazyLock;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use regex::Regex;
use serde::de::DeserializeOwned;

use shared_models::validation::{FieldErrors, REQUIRED};
use shared_models::AppError;

static MISSING_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"missing field `([^`]+)`").unwrap());

// serde_path_to_error prefixes the failing path: "target type: stock: invalid type ..."
static FIELD_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"target type: ([A-Za-z0-9_.\[\]]+): (.+?)(?: at line \d+ column \d+)?$").unwrap()
});

/// `Json<T>` whose rejections become field-level validation errors.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

pub fn rejection_to_error(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(err) => AppError::ValidationError(data_error_fields(&err.body_text())),
        JsonRejection::JsonSyntaxError(_) => {
            AppError::BadRequest("Malformed JSON body".to_string())
        }
        JsonRejection::MissingJsonContentType(_) => {
            AppError::BadRequest("Expected request with `Content-Type: application/json`".to_string())
        }
        other => AppError::BadRequest(other.body_text()),
    }
}

fn data_error_fields(message: &str) -> FieldErrors {
    if let Some(caps) = MISSING_FIELD.captures(message) {
        return FieldErrors::single(&caps[1], REQUIRED);
    }
    if let Some(caps) = FIELD_PATH.captures(message) {
        return FieldErrors::single(&caps[1], caps[2].to_string());
    }
    FieldErrors::single("non_field_errors", message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_becomes_required_message() {
        let fields = data_error_fields(
            "Failed to deserialize the JSON body into the target type: missing field `name` at line 1 column 2",
        );
        assert_eq!(fields.get("name"), [REQUIRED.to_string()]);
    }

    #[test]
    fn typed_path_becomes_field_message() {
        let fields = data_error_fields(
            "Failed to deserialize the JSON body into the target type: stock: invalid type: string \"many\", expected i32 at line 1 column 17",
        );
        assert_eq!(
            fields.get("stock"),
            ["invalid type: string \"many\", expected i32".to_string()]
        );
    }

    #[test]
    fn unrecognised_messages_are_not_dropped() {
        let fields = data_error_fields("something odd");
        assert_eq!(fields.get("non_field_errors"), ["something odd".to_string()]);
    }
}
