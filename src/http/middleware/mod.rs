//! Standard middleware stack.
//!
//! # Order (outermost first)
//! ```text
//! request_scope   → cancellation scope for the request
//! trace_context   → trace ids, X-Trace-Id
//! request_logger  → one log line + request metrics
//! error_handling  → panic recovery, 500 envelope
//! user_context    → gateway identity headers
//! skip_timeout    → exemption marker
//! timeout         → bounded execution (resilience::timeouts)
//! handler
//! ```
//!
//! The logger sits outside panic recovery so recovered requests are still
//! logged with their final 500.

pub mod error_handling;
pub mod request_logger;
pub mod request_scope;
pub mod skip_timeout;
pub mod trace_context;
pub mod user_context;

pub use error_handling::error_handling_middleware;
pub use request_logger::request_logger_middleware;
pub use request_scope::request_scope_middleware;
pub use skip_timeout::skip_timeout_middleware;
pub use trace_context::trace_context_middleware;
pub use user_context::{user_context_middleware, UserContext};
