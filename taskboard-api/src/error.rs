/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>`; service failures, validation
/// failures and extractor rejections all convert into it, and
/// `into_response` is the only place a failure becomes a status code.
///
/// # Body
///
/// ```json
/// {
///   "statusCode": 400,
///   "message": "Validation failed",
///   "errors": { "email": ["Email must be in a valid format"] }
/// }
/// ```
///
/// `errors` is only present for validation failures.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use taskboard_shared::error::ServiceError;
use validator::ValidationErrors;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Message returned for every 500 response
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred while processing your request.";

/// Field name (camelCase) to every message that applies to it
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Field validation failed (400)
    ValidationError(FieldErrors),

    /// Malformed body or path argument (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Not found (404)
    NotFound(String),

    /// Route exists but not for this method (405)
    MethodNotAllowed(String),

    /// Conflict (409) - duplicate email
    Conflict(String),

    /// Request aborted because the server is shutting down (503)
    ServiceUnavailable(String),

    /// Internal server error (500); the message is logged, never returned
    InternalError(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// HTTP status code, repeated in the body
    pub status_code: u16,

    /// Human-readable error message
    pub message: String,

    /// Validation errors by field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl ApiError {
    /// Status code this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} fields", errors.len())
            }
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::MethodNotAllowed(msg) => write!(f, "Method not allowed: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (message, errors) = match self {
            ApiError::ValidationError(errors) => {
                tracing::warn!(fields = ?errors.keys().collect::<Vec<_>>(), "Validation failed");
                ("Validation failed".to_string(), Some(errors))
            }
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::MethodNotAllowed(msg)
            | ApiError::Conflict(msg)
            | ApiError::ServiceUnavailable(msg) => {
                tracing::warn!(status = status.as_u16(), "{}", msg);
                (msg, None)
            }
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (GENERIC_ERROR_MESSAGE.to_string(), None)
            }
        };

        let body = Json(ErrorResponse {
            status_code: status.as_u16(),
            message,
            errors,
        });

        (status, body).into_response()
    }
}

/// Convert service failures to API errors
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::BadArgument(msg) => ApiError::BadRequest(msg),
            ServiceError::Cancelled => ApiError::ServiceUnavailable(
                "The request was cancelled because the server is shutting down.".to_string(),
            ),
            ServiceError::Unexpected(msg) => ApiError::InternalError(msg),
            ServiceError::Repository(err) => ApiError::InternalError(err.to_string()),
        }
    }
}

/// Collect every field failure, keyed by the camelCase wire name
impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();

        for (field, failures) in errors.field_errors() {
            let messages = failures
                .iter()
                .map(|failure| {
                    failure
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
                .collect::<Vec<_>>();

            fields
                .entry(camel_case(&field))
                .or_default()
                .extend(messages);
        }

        ApiError::ValidationError(fields)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// `due_date` -> `dueDate`
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;

    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }

    out
}
