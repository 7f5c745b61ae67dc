//! Request timeout middleware.
//!
//! Adapts [`Supervisor`] to axum: the downstream stack runs on a worker task
//! and commits its response into a [`ResponseSlot`]; whatever the slot holds
//! once supervision settles is what the client receives.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio_util::sync::CancellationToken;

use crate::config::SharedConfig;
use crate::http::request::{DeadlineToken, RequestMeta, RequestScope};
use crate::resilience::sink::ResponseSlot;
use crate::resilience::supervisor::Supervisor;

/// Non-standard status used when the request was cancelled before anything
/// was committed. The client is normally gone by then.
const CLIENT_CLOSED_REQUEST: u16 = 499;

pub async fn request_timeout_middleware(
    State(config): State<SharedConfig>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let timeout = config.load().timeout.request_timeout();
    let scope = RequestScope::ensure(&mut req);
    let meta = RequestMeta::from_request(&req);
    let slot = Arc::new(ResponseSlot::new());

    let worker_slot = Arc::clone(&slot);
    let worker_meta = meta.clone();
    let downstream = move |token: CancellationToken| async move {
        let mut req = req;
        req.extensions_mut().insert(DeadlineToken(token));
        let response = next.run(req).await;
        if let Err(late) = worker_slot.commit(response) {
            tracing::warn!(
                path = %worker_meta.path,
                method = %worker_meta.method,
                status = %late.status(),
                "Discarding response produced after request was resolved"
            );
        }
    };

    Supervisor::new(timeout)
        .run(scope.as_ref(), slot.as_ref(), &meta, downstream)
        .await;

    slot.close();
    slot.take().unwrap_or_else(client_closed_response)
}

fn client_closed_response() -> Response {
    StatusCode::from_u16(CLIENT_CLOSED_REQUEST)
        .unwrap_or(StatusCode::REQUEST_TIMEOUT)
        .into_response()
}
