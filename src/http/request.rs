//! Per-request state shared across the middleware stack.
//!
//! # Responsibilities
//! - Carry the request's cancellation token, timeout exemption and abort flag
//! - Resolve the client address (proxy headers first, then the socket peer)
//! - Snapshot method/path/client for log fields
//!
//! # Design Decisions
//! - One `Arc<RequestScope>` per request, stored in the extensions
//! - Flags are atomics so the supervisor can update them from any task

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use tokio_util::sync::CancellationToken;

use crate::resilience::supervisor::AmbientContext;

const IP_HEADERS: &[&str] = &["cf-connecting-ip", "x-real-ip", "x-forwarded-for"];

/// Ambient state for one in-flight request.
#[derive(Debug)]
pub struct RequestScope {
    token: CancellationToken,
    skip_timeout: AtomicBool,
    aborted: AtomicBool,
}

impl RequestScope {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            skip_timeout: AtomicBool::new(false),
            aborted: AtomicBool::new(false),
        }
    }

    /// A scope with its own root token, for requests that did not pass
    /// through the scope middleware.
    pub fn detached() -> Self {
        Self::new(CancellationToken::new())
    }

    /// Exempt this request from the deadline.
    pub fn mark_skip_timeout(&self) {
        self.skip_timeout.store(true, Ordering::Release);
    }

    /// Set once the supervisor has answered this request with a timeout.
    ///
    /// Handlers still running after that point can check it to skip further
    /// work; any response they produce is refused by the closed slot.
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    pub fn get<B>(req: &Request<B>) -> Option<Arc<RequestScope>> {
        req.extensions().get::<Arc<RequestScope>>().cloned()
    }

    /// Return the request's scope, installing a detached one if absent.
    pub fn ensure<B>(req: &mut Request<B>) -> Arc<RequestScope> {
        if let Some(scope) = Self::get(req) {
            return scope;
        }
        let scope = Arc::new(Self::detached());
        req.extensions_mut().insert(Arc::clone(&scope));
        scope
    }
}

impl AmbientContext for RequestScope {
    fn cancellation(&self) -> &CancellationToken {
        &self.token
    }

    fn skip_timeout(&self) -> bool {
        self.skip_timeout.load(Ordering::Acquire)
    }

    fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
    }
}

/// Cancellation token of the active deadline, visible to handlers that want
/// to stop early.
#[derive(Debug, Clone)]
pub struct DeadlineToken(pub CancellationToken);

/// Log fields captured before the request is handed downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMeta {
    pub method: String,
    pub path: String,
    pub client_ip: String,
}

impl RequestMeta {
    pub fn from_request<B>(req: &Request<B>) -> Self {
        Self {
            method: req.method().to_string(),
            path: req.uri().path().to_string(),
            client_ip: client_ip(req)
                .map(|ip| ip.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

/// Client address: first valid proxy header wins, then the TCP peer.
pub fn client_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    for header in IP_HEADERS {
        let ip = req
            .headers()
            .get(*header)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(str::trim)
            .and_then(|s| s.parse::<IpAddr>().ok());

        if ip.is_some() {
            return ip;
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarded_chain_takes_first_hop() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.195, 70.41.3.18")
            .body(())
            .unwrap();
        assert_eq!(client_ip(&req), Some("203.0.113.195".parse().unwrap()));
    }

    #[test]
    fn test_real_ip_beats_forwarded_for() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.1")
            .header("x-real-ip", "192.0.2.1")
            .body(())
            .unwrap();
        assert_eq!(client_ip(&req), Some("192.0.2.1".parse().unwrap()));
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let mut req = Request::builder()
            .header("x-real-ip", "not-an-ip")
            .body(())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 9], 4000))));
        assert_eq!(client_ip(&req), Some("10.0.0.9".parse().unwrap()));
    }

    #[test]
    fn test_meta_unknown_client() {
        let req = Request::builder()
            .method("POST")
            .uri("/posts?draft=1")
            .body(())
            .unwrap();
        let meta = RequestMeta::from_request(&req);
        assert_eq!(meta.method, "POST");
        assert_eq!(meta.path, "/posts");
        assert_eq!(meta.client_ip, "unknown");
    }

    #[test]
    fn test_ensure_reuses_existing_scope() {
        let mut req = Request::builder().body(()).unwrap();
        let first = RequestScope::ensure(&mut req);
        first.mark_skip_timeout();

        let second = RequestScope::ensure(&mut req);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.skip_timeout());
    }

    #[test]
    fn test_abort_flag() {
        let scope = RequestScope::detached();
        assert!(!scope.is_aborted());
        scope.abort();
        assert!(scope.is_aborted());
    }
}
