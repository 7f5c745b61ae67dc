//! Cancellable deadline scope derived from a parent token.
//!
//! # States
//! ```text
//! Armed ──timer fires──────────▶ Cancelled(DeadlineExceeded)
//! Armed ──parent cancelled─────▶ Cancelled(Cancelled)
//! Armed ──release()────────────▶ Cancelled(Cancelled)
//! ```
//!
//! The first transition wins: the cause is recorded before the token is
//! cancelled, so anyone woken by the token reads a settled cause.
//!
//! # Design Decisions
//! - One timer task per context; `release` aborts it (no leaked timers)
//! - `release` is idempotent and also runs on drop, so every exit path
//!   (including unwinding) frees the timer exactly once

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a deadline context was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCause {
    /// The configured timeout elapsed.
    DeadlineExceeded,
    /// The parent was cancelled (client gone, server draining) or the
    /// context was released.
    Cancelled,
}

impl fmt::Display for CancelCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelCause::DeadlineExceeded => f.write_str("deadline exceeded"),
            CancelCause::Cancelled => f.write_str("context cancelled"),
        }
    }
}

const CAUSE_NONE: u8 = 0;
const CAUSE_DEADLINE: u8 = 1;
const CAUSE_CANCELLED: u8 = 2;

struct Shared {
    cause: AtomicU8,
    token: CancellationToken,
}

impl Shared {
    fn cancel(&self, cause: CancelCause) {
        let code = match cause {
            CancelCause::DeadlineExceeded => CAUSE_DEADLINE,
            CancelCause::Cancelled => CAUSE_CANCELLED,
        };
        let _ = self
            .cause
            .compare_exchange(CAUSE_NONE, code, Ordering::AcqRel, Ordering::Acquire);
        self.token.cancel();
    }

    fn cause(&self) -> Option<CancelCause> {
        match self.cause.load(Ordering::Acquire) {
            CAUSE_DEADLINE => Some(CancelCause::DeadlineExceeded),
            CAUSE_CANCELLED => Some(CancelCause::Cancelled),
            _ => None,
        }
    }
}

type ReleaseHook = Box<dyn FnOnce() + Send + Sync>;

/// A cancellation scope that expires after a fixed timeout.
///
/// Must be created inside a Tokio runtime.
pub struct DeadlineContext {
    shared: Arc<Shared>,
    /// `None` when the timeout reaches past what `Instant` can represent.
    deadline: Option<Instant>,
    timeout: Duration,
    timer: Option<JoinHandle<()>>,
    on_release: Option<ReleaseHook>,
}

impl DeadlineContext {
    /// Derive a deadline scope from `parent` that expires after `timeout`.
    pub fn new(parent: &CancellationToken, timeout: Duration) -> Self {
        let shared = Arc::new(Shared {
            cause: AtomicU8::new(CAUSE_NONE),
            token: CancellationToken::new(),
        });
        let deadline = Instant::now().checked_add(timeout);

        let watcher = Arc::clone(&shared);
        let parent = parent.clone();
        let timer = tokio::spawn(async move {
            let expiry = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    // Unarmed: only the parent or a release ends the scope.
                    None => std::future::pending::<()>().await,
                }
            };
            let cause = tokio::select! {
                _ = expiry => CancelCause::DeadlineExceeded,
                _ = parent.cancelled() => CancelCause::Cancelled,
            };
            watcher.cancel(cause);
        });

        Self {
            shared,
            deadline,
            timeout,
            timer: Some(timer),
            on_release: None,
        }
    }

    /// Run `hook` once when the context is released.
    pub fn with_release_hook(mut self, hook: impl FnOnce() + Send + Sync + 'static) -> Self {
        self.on_release = Some(Box::new(hook));
        self
    }

    /// Token handed to downstream work; cancelled when the scope ends.
    pub fn token(&self) -> CancellationToken {
        self.shared.token.clone()
    }

    /// `None` while the context is still armed.
    pub fn cause(&self) -> Option<CancelCause> {
        self.shared.cause()
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.token.is_cancelled()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn remaining(&self) -> Duration {
        match self.deadline {
            Some(at) => at.saturating_duration_since(Instant::now()),
            None => Duration::MAX,
        }
    }

    /// Stop the timer and cancel the scope. Safe to call more than once.
    pub fn release(&mut self) {
        let Some(timer) = self.timer.take() else {
            return;
        };
        timer.abort();
        self.shared.cancel(CancelCause::Cancelled);
        if let Some(hook) = self.on_release.take() {
            hook();
        }
    }

    pub fn is_released(&self) -> bool {
        self.timer.is_none()
    }
}

impl Drop for DeadlineContext {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for DeadlineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeadlineContext")
            .field("timeout", &self.timeout)
            .field("cause", &self.cause())
            .field("released", &self.is_released())
            .finish()
    }
}
