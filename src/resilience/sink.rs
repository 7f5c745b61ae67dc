//! Single-commit response ownership.
//!
//! A supervised request has two parties that may want to answer it: the
//! handler task and the timeout supervisor. [`ResponseSlot`] lets exactly one
//! of them commit; every later attempt is rejected and handed back to the
//! caller so it can be logged.
//!
//! # States
//! ```text
//! Open ──commit──▶ Committed ──take──▶ Committed (response moved out)
//! Open ──close───▶ Closed
//! ```
//!
//! Check-then-commit happens under one lock, so the supervisor's "is anything
//! written yet?" test and its timeout write cannot interleave with a handler
//! commit.

use std::sync::{Mutex, MutexGuard, PoisonError};

use axum::http::StatusCode;
use axum::response::Response;

use crate::http::response::timeout_response;

/// What the supervisor needs from the response it is guarding.
pub trait ResponseSink: Send + Sync {
    /// True once any party has committed a response.
    fn is_committed(&self) -> bool;

    /// Status of the committed response, if any.
    fn committed_status(&self) -> Option<StatusCode>;

    /// Commit the standard 504 envelope unless something is already
    /// committed. Returns whether this call wrote it.
    fn write_timeout_response(&self) -> bool;
}

/// Which side won the commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Committer {
    Handler,
    Supervisor,
}

enum SlotState {
    Open,
    Committed {
        status: StatusCode,
        by: Committer,
        response: Option<Response>,
    },
    Closed,
}

/// One-shot holder for a request's response.
pub struct ResponseSlot {
    state: Mutex<SlotState>,
}

impl ResponseSlot {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Open),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Commit a handler response. Returns it back if the slot was already
    /// committed or closed.
    pub fn commit(&self, response: Response) -> Result<(), Response> {
        self.commit_as(response, Committer::Handler)
    }

    fn commit_as(&self, response: Response, by: Committer) -> Result<(), Response> {
        let mut state = self.lock();
        match *state {
            SlotState::Open => {
                *state = SlotState::Committed {
                    status: response.status(),
                    by,
                    response: Some(response),
                };
                Ok(())
            }
            SlotState::Committed { .. } | SlotState::Closed => Err(response),
        }
    }

    /// Move the committed response out. The slot stays committed.
    pub fn take(&self) -> Option<Response> {
        match &mut *self.lock() {
            SlotState::Committed { response, .. } => response.take(),
            _ => None,
        }
    }

    /// Refuse all further commits if nothing was committed yet.
    pub fn close(&self) {
        let mut state = self.lock();
        if matches!(*state, SlotState::Open) {
            *state = SlotState::Closed;
        }
    }

    pub fn committer(&self) -> Option<Committer> {
        match &*self.lock() {
            SlotState::Committed { by, .. } => Some(*by),
            _ => None,
        }
    }
}

impl Default for ResponseSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSink for ResponseSlot {
    fn is_committed(&self) -> bool {
        matches!(*self.lock(), SlotState::Committed { .. })
    }

    fn committed_status(&self) -> Option<StatusCode> {
        match &*self.lock() {
            SlotState::Committed { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn write_timeout_response(&self) -> bool {
        self.commit_as(timeout_response(), Committer::Supervisor).is_ok()
    }
}
