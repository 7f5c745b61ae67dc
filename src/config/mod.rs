//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults + TOML file + environment
//!     → loader.rs (merge & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated)
//!     → shared via ArcSwap to middleware
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → HttpServer stores it into the ArcSwap
//!     → next request sees the new timeout and skip paths
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Readers take a cheap snapshot per request; no locks on the hot path
//! - Validation separates syntactic (serde) from semantic checks

use std::sync::Arc;

use arc_swap::ArcSwap;

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    LogEncoding, LoggingConfig, MetricsConfig, ServerConfig, ServiceConfig, TimeoutConfig,
    TraceConfig,
};
pub use watcher::ConfigWatcher;

/// Live configuration, swapped atomically on reload.
pub type SharedConfig = Arc<ArcSwap<ServiceConfig>>;

pub fn shared(config: ServiceConfig) -> SharedConfig {
    Arc::new(ArcSwap::from_pointee(config))
}
