//! Shared service errors.
//!
//! Repository and service layers return these so that handlers can map
//! them onto the standard response envelope without knowing where they came
//! from. Internal details are logged, never sent to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::response::{codes, respond_error, INTERNAL_MESSAGE};

/// Errors shared by every service built on this library.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The repository found no matching record.
    #[error("record not found")]
    NotFound,

    /// A dependency is saturated; the caller should retry later.
    #[error("service busy, please retry later")]
    ServiceBusy,

    /// Anything else. The message is logged and replaced on the wire.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// HTTP status and envelope code for this error.
    pub fn status_and_code(&self) -> (StatusCode, i32) {
        match self {
            ServiceError::NotFound => (StatusCode::NOT_FOUND, codes::CLIENT_RESOURCE_NOT_FOUND),
            ServiceError::ServiceBusy => (StatusCode::SERVICE_UNAVAILABLE, codes::SERVER_INTERNAL),
            ServiceError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, codes::SERVER_INTERNAL),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        match &self {
            ServiceError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal service error");
                respond_error(status, code, INTERNAL_MESSAGE)
            }
            other => respond_error(status, code, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(ServiceError::NotFound.to_string(), "record not found");
        assert!(ServiceError::ServiceBusy.to_string().contains("retry"));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ServiceError::NotFound.status_and_code().0, StatusCode::NOT_FOUND);
        assert_eq!(
            ServiceError::Internal("db down".into()).status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, codes::SERVER_INTERNAL)
        );
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let response = ServiceError::Internal("password=hunter2".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
