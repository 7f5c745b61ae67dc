//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request:
//!     → timeouts.rs (axum middleware, builds slot + metadata)
//!     → supervisor.rs (spawn worker, arbitrate completion/deadline/fault)
//!         → deadline.rs (timer-backed cancellation scope)
//!         → sink.rs (single-commit response slot)
//!         → fault.rs (captured panic, re-raised to the recovery layer)
//! ```
//!
//! # Design Decisions
//! - Every supervised request has a deadline unless explicitly exempted
//! - Cancellation is cooperative; workers are never aborted
//! - No further processing reaches the client after a timeout: the slot is
//!   closed once supervision settles and refuses late commits, while
//!   `RequestScope::is_aborted` lets handlers stop early
//! - Panics are not answered here; they travel to `error_handling`

pub mod deadline;
pub mod fault;
pub mod sink;
pub mod supervisor;
pub mod timeouts;

pub use deadline::{CancelCause, DeadlineContext};
pub use fault::Fault;
pub use sink::{Committer, ResponseSink, ResponseSlot};
pub use supervisor::{AmbientContext, Outcome, Supervisor};
pub use timeouts::request_timeout_middleware;
