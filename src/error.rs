//! Structured error types for service responses.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors
    ValidationError,
    InvalidInput,
    ConstraintViolation,

    NotFound,

    // Reserved; nothing in the task schema is unique apart from the id.
    Conflict,

    InternalError,
}

impl ErrorCode {
    /// HTTP status code for this error class.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::ValidationError | ErrorCode::InvalidInput | ErrorCode::ConstraintViolation => {
                400
            }
            ErrorCode::NotFound => 404,
            ErrorCode::Conflict => 409,
            ErrorCode::InternalError => 500,
        }
    }
}

/// Field-level error for validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors produced by the task service.
///
/// Storage-layer errors are always classified into one of these variants
/// before they reach a response.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation failed: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("Task not found: {0}")]
    NotFound(i64),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ServiceError {
    pub fn invalid_id(raw: &str) -> Self {
        ServiceError::InvalidInput(format!("Invalid task id: '{}' (expected a positive integer)", raw))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::Validation(_) => ErrorCode::ValidationError,
            ServiceError::NotFound(_) => ErrorCode::NotFound,
            ServiceError::InvalidInput(_) => ErrorCode::InvalidInput,
            ServiceError::ConstraintViolation(_) => ErrorCode::ConstraintViolation,
            ServiceError::Conflict(_) => ErrorCode::Conflict,
            ServiceError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Message safe to show a client. Internal causes are not included.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::Validation(_) => "Validation failed".to_string(),
            ServiceError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Field-level details, present only for validation errors.
    pub fn field_errors(&self) -> Option<&[FieldError]> {
        match self {
            ServiceError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                ServiceError::ConstraintViolation(msg.unwrap_or_else(|| e.to_string()))
            }
            other => ServiceError::Internal(other.into()),
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_to_http_status() {
        assert_eq!(ServiceError::NotFound(3).code().http_status(), 404);
        assert_eq!(ServiceError::invalid_id("abc").code().http_status(), 400);
        assert_eq!(ServiceError::Validation(vec![]).code().http_status(), 400);
        assert_eq!(
            ServiceError::ConstraintViolation("x".into()).code().http_status(),
            400
        );
        assert_eq!(ServiceError::Conflict("x".into()).code().http_status(), 409);
        assert_eq!(
            ServiceError::Internal(anyhow::anyhow!("boom")).code().http_status(),
            500
        );
    }

    #[test]
    fn internal_message_is_hidden() {
        let err = ServiceError::Internal(anyhow::anyhow!("disk on fire"));
        assert_eq!(err.public_message(), "Internal server error");
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn validation_display_lists_every_field() {
        let err = ServiceError::Validation(vec![
            FieldError::new("title", "Title is required"),
            FieldError::new("status", "bad"),
        ]);
        let text = err.to_string();
        assert!(text.contains("title: Title is required"));
        assert!(text.contains("status: bad"));
        assert_eq!(err.field_errors().map(|f| f.len()), Some(2));
    }

    #[test]
    fn error_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::ValidationError).unwrap();
        assert_eq!(json, "\"VALIDATION_ERROR\"");
    }

    #[test]
    fn sqlite_constraint_failure_is_classified() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_NOTNULL),
            Some("NOT NULL constraint failed: tasks.title".into()),
        );
        let classified: ServiceError = err.into();
        assert_eq!(classified.code(), ErrorCode::ConstraintViolation);
        assert!(classified.to_string().contains("tasks.title"));
    }

    #[test]
    fn other_sqlite_errors_are_internal() {
        let classified: ServiceError = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(classified.code(), ErrorCode::InternalError);
    }
}
