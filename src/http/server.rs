//! HTTP server setup.
//!
//! # Responsibilities
//! - Wrap the application's routes in the standard middleware stack
//! - Bind to a listener and serve with graceful shutdown
//! - Apply configuration reloads to the live config
//! - Cancel requests still running once the shutdown grace period ends

use std::net::SocketAddr;
use std::sync::Arc;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::config::{ServiceConfig, SharedConfig};
use crate::http::middleware::{
    error_handling_middleware, request_logger_middleware, request_scope_middleware,
    skip_timeout_middleware, trace_context_middleware, user_context_middleware,
};
use crate::resilience::timeouts::request_timeout_middleware;

/// Apply the standard stack to `routes`. `requests` is the parent of every
/// request's cancellation scope.
pub fn build_router(routes: Router, config: SharedConfig, requests: CancellationToken) -> Router {
    routes
        .layer(from_fn_with_state(config.clone(), request_timeout_middleware))
        .layer(from_fn_with_state(config.clone(), skip_timeout_middleware))
        .layer(from_fn(user_context_middleware))
        .layer(from_fn(error_handling_middleware))
        .layer(from_fn(request_logger_middleware))
        .layer(from_fn_with_state(config, trace_context_middleware))
        .layer(from_fn_with_state(requests, request_scope_middleware))
        .layer(TraceLayer::new_for_http())
}

/// HTTP server for a service.
pub struct HttpServer {
    router: Router,
    config: SharedConfig,
    requests: CancellationToken,
}

impl HttpServer {
    pub fn new(config: ServiceConfig, routes: Router) -> Self {
        let config = crate::config::shared(config);
        let requests = CancellationToken::new();
        let router = build_router(routes, Arc::clone(&config), requests.clone());
        Self {
            router,
            config,
            requests,
        }
    }

    /// Live configuration; stores are visible to the next request.
    pub fn config(&self) -> SharedConfig {
        Arc::clone(&self.config)
    }

    /// The fully layered router, for driving without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` is cancelled and in-flight requests drain.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<ServiceConfig>,
        shutdown: CancellationToken,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let (service, grace) = {
            let current = self.config.load();
            (
                current.trace.service_name.clone(),
                current.server.shutdown_grace(),
            )
        };
        tracing::info!(address = %addr, service = %service, "HTTP server starting");

        let reloader = tokio::spawn(apply_reloads(
            Arc::clone(&self.config),
            config_updates,
            shutdown.clone(),
        ));

        let requests = self.requests.clone();
        let drain = shutdown.clone();
        let canceller = tokio::spawn(async move {
            drain.cancelled().await;
            tokio::time::sleep(grace).await;
            tracing::warn!(
                grace_ms = grace.as_millis() as u64,
                "Shutdown grace period elapsed, cancelling in-flight requests"
            );
            requests.cancel();
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("Shutdown requested, draining connections");
            })
            .await;

        canceller.abort();
        reloader.abort();
        self.requests.cancel();

        result?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn apply_reloads(
    live: SharedConfig,
    mut updates: mpsc::UnboundedReceiver<ServiceConfig>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            update = updates.recv() => match update {
                Some(next) => {
                    tracing::info!(
                        request_timeout_ms = next.timeout.request_ms,
                        skip_paths = ?next.timeout.skip_paths,
                        "Configuration reloaded"
                    );
                    live.store(Arc::new(next));
                }
                None => break,
            },
        }
    }
}
