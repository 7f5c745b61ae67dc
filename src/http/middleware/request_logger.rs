//! One structured log line per request.

use std::time::Instant;

use axum::body::Body;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::Response;

use crate::http::request::RequestMeta;
use crate::observability::metrics;
use crate::observability::trace_context::{TraceIds, UNKNOWN_SPAN_ID, UNKNOWN_TRACE_ID};

pub async fn request_logger_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let meta = RequestMeta::from_request(&req);
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let trace = req.extensions().get::<TraceIds>().cloned();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let (trace_id, span_id) = match &trace {
        Some(ids) => (ids.trace_id.as_str(), ids.span_id.as_str()),
        None => (UNKNOWN_TRACE_ID, UNKNOWN_SPAN_ID),
    };

    tracing::info!(
        trace_id,
        span_id,
        http.method = %meta.method,
        url.path = %meta.path,
        http.status_code = status,
        duration_ms = start.elapsed().as_millis() as u64,
        client.address = %meta.client_ip,
        user_agent.original = %user_agent,
        "HTTP request processed"
    );
    metrics::record_request(&meta.method, status, start);

    response
}
