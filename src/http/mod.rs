//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, middleware stack)
//!     → middleware/ (scope, trace, logging, recovery, identity, exemption)
//!     → resilience::timeouts (bounded execution)
//!     → application handler
//!     → response.rs (standard envelope)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{DeadlineToken, RequestMeta, RequestScope};
pub use response::{codes, respond_error, respond_success, ApiResponse};
pub use server::{build_router, HttpServer};
