//! Outermost panic recovery.
//!
//! Any panic that escapes the stack below, including one re-raised by the
//! timeout supervisor, is logged once and answered with the standard 500
//! envelope.

use std::panic::AssertUnwindSafe;

use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use futures_util::FutureExt;

use crate::http::request::RequestMeta;
use crate::http::response::internal_error_response;
use crate::observability::metrics;
use crate::resilience::fault::Fault;

pub async fn error_handling_middleware(req: Request<Body>, next: Next) -> Response {
    let meta = RequestMeta::from_request(&req);

    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            let fault = Fault::from_panic(payload);
            tracing::error!(
                error = %fault.message(),
                error_type = fault.kind(),
                path = %meta.path,
                method = %meta.method,
                client_ip = %meta.client_ip,
                "Recovered from handler panic"
            );
            metrics::record_panic();
            internal_error_response()
        }
    }
}
