//! Trace context extraction.
//!
//! Continues the caller's W3C trace (or starts one), makes the ids available
//! to handlers and log lines, and echoes the trace id in `X-Trace-Id`.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;

use crate::config::SharedConfig;
use crate::observability::trace_context::{TraceIds, X_TRACE_ID};

pub async fn trace_context_middleware(
    State(config): State<SharedConfig>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let ids = TraceIds::extract(req.headers());
    req.extensions_mut().insert(ids.clone());

    let span = tracing::info_span!(
        "request",
        trace_id = %ids.trace_id,
        span_id = %ids.span_id
    );
    let mut response = next.run(req).instrument(span).await;

    if config.load().trace.expose_trace_header {
        if let Ok(value) = HeaderValue::from_str(&ids.trace_id) {
            response.headers_mut().insert(X_TRACE_ID, value);
        }
    }
    response
}
