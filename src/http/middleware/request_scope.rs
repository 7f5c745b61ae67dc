//! Installs the per-request [`RequestScope`].
//!
//! The scope's token is a child of the server's request token, so it is
//! cancelled when the server gives up on draining, and also when this
//! future is dropped because the client went away.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use tokio_util::sync::CancellationToken;

use crate::http::request::RequestScope;

pub async fn request_scope_middleware(
    State(requests): State<CancellationToken>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = requests.child_token();
    let guard = token.clone().drop_guard();
    req.extensions_mut()
        .insert(Arc::new(RequestScope::new(token)));

    let response = next.run(req).await;
    guard.disarm();
    response
}
