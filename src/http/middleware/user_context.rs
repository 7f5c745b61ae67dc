//! Caller identity forwarded by the gateway.
//!
//! The gateway authenticates the caller and forwards who they are in plain
//! headers. Values are kept as received; typed accessors parse on demand so
//! a malformed header never rejects the request by itself.

use std::convert::Infallible;

use axum::body::Body;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;

use crate::models::enums::{Platform, UserRole, UserStatus};

pub const X_USER_ID: &str = "x-user-id";
pub const X_USER_ROLE: &str = "x-user-role";
pub const X_USER_STATUS: &str = "x-user-status";
pub const X_PLATFORM: &str = "x-platform";

/// Identity attached to every request; empty strings when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserContext {
    pub user_id: String,
    pub role: String,
    pub status: String,
    pub platform: String,
}

impl UserContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            user_id: get(X_USER_ID),
            role: get(X_USER_ROLE),
            status: get(X_USER_STATUS),
            platform: get(X_PLATFORM),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.user_id.is_empty()
    }

    pub fn user_role(&self) -> Option<UserRole> {
        self.role.parse().ok()
    }

    pub fn user_status(&self) -> Option<UserStatus> {
        self.status.parse().ok()
    }

    pub fn client_platform(&self) -> Option<Platform> {
        self.platform.parse().ok()
    }
}

pub async fn user_context_middleware(mut req: Request<Body>, next: Next) -> Response {
    let ctx = UserContext::from_headers(req.headers());
    req.extensions_mut().insert(ctx);
    next.run(req).await
}

impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<UserContext>()
            .cloned()
            .unwrap_or_else(|| UserContext::from_headers(&parts.headers)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_gateway_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(X_USER_ID, "u-17".parse().unwrap());
        headers.insert(X_USER_ROLE, "1".parse().unwrap());
        headers.insert(X_USER_STATUS, "active".parse().unwrap());
        headers.insert(X_PLATFORM, "wechat".parse().unwrap());

        let ctx = UserContext::from_headers(&headers);
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.user_role(), Some(UserRole::User));
        assert_eq!(ctx.user_status(), Some(UserStatus::Active));
        assert_eq!(ctx.client_platform(), Some(Platform::Wechat));
    }

    #[test]
    fn test_missing_headers_are_anonymous() {
        let ctx = UserContext::from_headers(&HeaderMap::new());
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.user_role(), None);
        assert_eq!(ctx.client_platform(), None);
    }
}
