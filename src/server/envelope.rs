//! The uniform JSON response envelope.

use crate::error::{ErrorCode, FieldError, ServiceError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// `{success, data?, error?, message?, count?}` wrapper used by every response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::empty(true)
        }
    }

    /// Success with no payload (used by delete).
    pub fn ok_empty() -> Self {
        Self::empty(true)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::empty(false)
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn empty(success: bool) -> Self {
        Self {
            success,
            data: None,
            error: None,
            message: None,
            count: None,
            code: None,
            details: None,
            stack: None,
        }
    }
}

impl<T> Envelope<Vec<T>> {
    /// List envelope; `count` mirrors the array length.
    pub fn list(items: Vec<T>) -> Self {
        let count = items.len();
        Self::ok(items).with_count(count)
    }
}

/// A classified service error ready to be written as a failure envelope.
#[derive(Debug)]
pub struct ApiFailure {
    error: ServiceError,
    expose_internal: bool,
}

impl ApiFailure {
    /// Wrap an error. Internal causes are only included when `expose_internal` is set.
    pub fn new(error: ServiceError, expose_internal: bool) -> Self {
        Self {
            error,
            expose_internal,
        }
    }

    pub fn error(&self) -> &ServiceError {
        &self.error
    }

    fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.error.code().http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn envelope(&self) -> Envelope<()> {
        let mut envelope = Envelope::failure(self.error.public_message());
        envelope.code = Some(self.error.code());
        envelope.details = self.error.field_errors().map(<[FieldError]>::to_vec);
        if let ServiceError::Internal(cause) = &self.error
            && self.expose_internal
        {
            envelope.stack = Some(format!("{:?}", cause));
        }
        envelope
    }
}

impl From<ServiceError> for ApiFailure {
    fn from(error: ServiceError) -> Self {
        Self::new(error, false)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        match &self.error {
            ServiceError::Internal(cause) => error!(error = ?cause, "Unhandled service error"),
            other => debug!(code = ?other.code(), error = %other, "Request rejected"),
        }
        (self.status(), Json(self.envelope())).into_response()
    }
}
