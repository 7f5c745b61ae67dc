//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, histograms)
//!     → trace_context.rs (W3C trace ids carried through each request)
//!
//! Consumers:
//!     → Log aggregation (stdout, errors on stderr)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Trace id flows through every request log line
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
pub mod trace_context;

pub use logging::{init_logging, LoggingError};
pub use trace_context::TraceIds;
