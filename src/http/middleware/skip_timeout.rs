//! Timeout exemption policy.
//!
//! Marks requests under any configured `timeout.skip_paths` prefix so the
//! supervisor runs them without a deadline.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::config::SharedConfig;
use crate::http::request::RequestScope;

pub async fn skip_timeout_middleware(
    State(config): State<SharedConfig>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if config.load().timeout.is_exempt(req.uri().path()) {
        RequestScope::ensure(&mut req).mark_skip_timeout();
        tracing::debug!(path = %req.uri().path(), "Request exempt from timeout");
    }
    next.run(req).await
}
