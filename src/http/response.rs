//! Standard JSON response envelope.
//!
//! Every service answers with the same shape so that gateways and clients
//! can handle errors uniformly:
//!
//! ```text
//! { "code": 0, "message": "success", "data": { ... } }
//! { "code": 50002, "message": "Request timed out, please try again later." }
//! ```
//!
//! `message` is omitted when empty and `data` when absent.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Application error codes carried in the `code` field.
pub mod codes {
    /// Operation succeeded.
    pub const SUCCESS: i32 = 0;

    pub const CLIENT_INVALID_INPUT: i32 = 40001;
    pub const CLIENT_UNAUTHORIZED: i32 = 40101;
    pub const CLIENT_ACCESS_TOKEN_EXPIRED: i32 = 40102;
    pub const CLIENT_REFRESH_TOKEN_EXPIRED: i32 = 40103;
    pub const CLIENT_FORBIDDEN: i32 = 40301;
    pub const CLIENT_RESOURCE_NOT_FOUND: i32 = 40401;
    pub const CLIENT_RATE_LIMIT_EXCEEDED: i32 = 42901;

    pub const SERVER_INTERNAL: i32 = 50001;
    pub const SERVER_TIMEOUT: i32 = 50002;
    /// Gateway only: no upstream service registered for the route.
    pub const SERVICE_NOT_FOUND: i32 = 50003;
}

/// Message sent with a supervisor-generated 504.
pub const TIMEOUT_MESSAGE: &str = "Request timed out, please try again later.";

/// Message sent with a recovered-panic 500.
pub const INTERNAL_MESSAGE: &str = "Internal server error, please try again later.";

/// Generic response envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    /// 0 on success, one of [`codes`] otherwise.
    pub code: i32,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, message: Option<&str>) -> Self {
        Self {
            code: codes::SUCCESS,
            message: message.unwrap_or("success").to_string(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

/// 200 with `code = 0`. `message` defaults to `"success"`.
pub fn respond_success<T: Serialize>(data: T, message: Option<&str>) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data, message))).into_response()
}

/// Error envelope with the given HTTP status and application code.
pub fn respond_error(status: StatusCode, code: i32, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::error(code, message))).into_response()
}

/// The response the timeout supervisor commits when a deadline expires.
pub fn timeout_response() -> Response {
    respond_error(StatusCode::GATEWAY_TIMEOUT, codes::SERVER_TIMEOUT, TIMEOUT_MESSAGE)
}

/// The response the panic-recovery middleware sends.
pub fn internal_error_response() -> Response {
    respond_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        codes::SERVER_INTERNAL,
        INTERNAL_MESSAGE,
    )
}
