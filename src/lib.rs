//! Shared service library.
//!
//! Cross-cutting pieces every HTTP service in the fleet needs: layered
//! configuration, logging and metrics setup, trace propagation, the standard
//! response envelope, shared enums and event payloads, and a request
//! supervisor that bounds handler execution time.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod models;
pub mod observability;
pub mod resilience;

pub use config::{ServiceConfig, SharedConfig};
pub use error::ServiceError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use resilience::{Outcome, Supervisor};
