//! Bounded-execution request supervisor.
//!
//! Runs a request's downstream work on its own task under a deadline and
//! settles the response into exactly one terminal state.
//!
//! # States
//! ```text
//! Start ──exempt / zero timeout──▶ RunInline ─────────────────▶ Exempt
//! Start ──────────────────────────▶ Running
//! Running ──completion first──────▶ Completed
//! Running ──deadline first────────▶ TimedOut ─┬─ not committed: write 504
//!                                             └─ committed: log only
//! Running ──parent cancelled first▶ Cancelled (nothing written)
//! Running ──fault relayed first───▶ Faulted ──▶ re-raised to caller
//! ```
//!
//! # Rules
//! - The supervising task suspends once, at the three-way wait
//! - First observed signal wins; later signals are ignored
//! - Cancellation is cooperative: downstream gets the deadline token and is
//!   never aborted
//! - The deadline context is released exactly once on every exit path
//! - The supervisor never writes an error body for a fault; it re-raises

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::http::request::RequestMeta;
use crate::observability::metrics;
use crate::resilience::deadline::{CancelCause, DeadlineContext};
use crate::resilience::fault::Fault;
use crate::resilience::sink::ResponseSink;

/// Request-scoped state the supervisor reads at entry and updates at exit.
pub trait AmbientContext: Send + Sync {
    /// Base cancellation for the request.
    fn cancellation(&self) -> &CancellationToken;

    /// Upstream policy exempted this request from the deadline.
    fn skip_timeout(&self) -> bool;

    /// Mark the request as finished; later stages must not process it.
    fn abort(&self);

    /// Derive the deadline scope for one supervised run.
    fn with_deadline(&self, timeout: Duration) -> DeadlineContext {
        DeadlineContext::new(self.cancellation(), timeout)
    }
}

/// How a supervised request ended. A fault is not an outcome: it surfaces as
/// `Err(Fault)` from [`Supervisor::arbitrate`] or a panic from
/// [`Supervisor::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Ran inline without a deadline.
    Exempt,
    /// Downstream finished before the deadline.
    Completed,
    /// Deadline expired. `responded` is false when a response was already
    /// committed and the 504 was suppressed.
    TimedOut { responded: bool },
    /// The parent context was cancelled for a reason other than the deadline.
    Cancelled,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Exempt => "exempt",
            Outcome::Completed => "completed",
            Outcome::TimedOut { responded: true } => "timeout_exceeded",
            Outcome::TimedOut { responded: false } => "timeout_after_commit",
            Outcome::Cancelled => "upstream_cancelled",
        }
    }
}

const FAULT_LABEL: &str = "downstream_fault";

enum Signal {
    Completed,
    Faulted(Fault),
    Cancelled(CancelCause),
}

/// Deadline enforcement for one class of requests.
#[derive(Debug, Clone, Copy)]
pub struct Supervisor {
    timeout: Duration,
}

impl Supervisor {
    /// A zero `timeout` disables enforcement.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Supervise `downstream` and re-raise any handler panic on the calling
    /// task so an outer recovery layer can answer it.
    pub async fn run<C, S, F, Fut>(
        &self,
        ctx: &C,
        sink: &S,
        meta: &RequestMeta,
        downstream: F,
    ) -> Outcome
    where
        C: AmbientContext + ?Sized,
        S: ResponseSink + ?Sized,
        F: FnOnce(CancellationToken) -> Fut + Send,
        Fut: Future<Output = ()> + Send + 'static,
    {
        match self.arbitrate(ctx, sink, meta, downstream).await {
            Ok(outcome) => outcome,
            Err(fault) => {
                tracing::error!(
                    path = %meta.path,
                    method = %meta.method,
                    panic = %fault.message(),
                    "Re-raising handler panic to recovery layer"
                );
                fault.resume()
            }
        }
    }

    /// Supervise `downstream`, returning a captured panic as `Err` instead of
    /// re-raising it.
    pub async fn arbitrate<C, S, F, Fut>(
        &self,
        ctx: &C,
        sink: &S,
        meta: &RequestMeta,
        downstream: F,
    ) -> Result<Outcome, Fault>
    where
        C: AmbientContext + ?Sized,
        S: ResponseSink + ?Sized,
        F: FnOnce(CancellationToken) -> Fut + Send,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if ctx.skip_timeout() || self.timeout.is_zero() {
            tracing::debug!(path = %meta.path, "Request timeout skipped");
            downstream(ctx.cancellation().clone()).await;
            metrics::record_supervision(Outcome::Exempt.as_str());
            return Ok(Outcome::Exempt);
        }

        let mut deadline = ctx.with_deadline(self.timeout);
        let deadline_token = deadline.token();
        let work = downstream(deadline.token());

        let (done_tx, done_rx) = oneshot::channel::<()>();
        let (fault_tx, mut fault_rx) = mpsc::channel::<Fault>(1);
        let worker_meta = meta.clone();

        let worker = async move {
            match AssertUnwindSafe(work).catch_unwind().await {
                Ok(()) => {
                    let _ = done_tx.send(());
                }
                Err(payload) => {
                    let fault = Fault::from_panic(payload);
                    tracing::error!(
                        path = %worker_meta.path,
                        method = %worker_meta.method,
                        panic = %fault.message(),
                        "Request handler panicked"
                    );
                    if fault_tx.try_send(fault).is_err() {
                        tracing::warn!(
                            path = %worker_meta.path,
                            "Handler panic not relayed, request already resolved"
                        );
                    }
                    drop(done_tx);
                }
            }
        };
        tokio::spawn(worker.instrument(tracing::Span::current()));

        let signal = tokio::select! {
            biased;
            Some(fault) = fault_rx.recv() => Signal::Faulted(fault),
            done = done_rx => match done {
                Ok(()) => Signal::Completed,
                // Worker dropped without finishing: its task was torn down.
                Err(_) => Signal::Cancelled(CancelCause::Cancelled),
            },
            _ = deadline_token.cancelled() => {
                Signal::Cancelled(deadline.cause().unwrap_or(CancelCause::Cancelled))
            }
        };

        let outcome = match signal {
            Signal::Completed => {
                tracing::debug!(path = %meta.path, "Request completed before deadline");
                Outcome::Completed
            }
            Signal::Cancelled(CancelCause::DeadlineExceeded) => self.on_deadline(ctx, sink, meta),
            Signal::Cancelled(CancelCause::Cancelled) => {
                tracing::info!(
                    path = %meta.path,
                    method = %meta.method,
                    error = %CancelCause::Cancelled,
                    "Request context cancelled before completion"
                );
                ctx.abort();
                Outcome::Cancelled
            }
            Signal::Faulted(fault) => {
                ctx.abort();
                deadline.release();
                metrics::record_supervision(FAULT_LABEL);
                return Err(fault);
            }
        };

        deadline.release();
        metrics::record_supervision(outcome.as_str());
        Ok(outcome)
    }

    fn on_deadline<C, S>(&self, ctx: &C, sink: &S, meta: &RequestMeta) -> Outcome
    where
        C: AmbientContext + ?Sized,
        S: ResponseSink + ?Sized,
    {
        tracing::warn!(
            timeout_ms = self.timeout.as_millis() as u64,
            error = %CancelCause::DeadlineExceeded,
            path = %meta.path,
            method = %meta.method,
            client_ip = %meta.client_ip,
            "Request processing timed out"
        );
        ctx.abort();

        if !sink.is_committed() && sink.write_timeout_response() {
            return Outcome::TimedOut { responded: true };
        }

        tracing::warn!(
            path = %meta.path,
            status = ?sink.committed_status(),
            "Request timed out after response was committed, 504 not sent"
        );
        Outcome::TimedOut { responded: false }
    }
}
