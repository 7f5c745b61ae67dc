//! Demo service built on the shared library.
//!
//! Serves a handful of routes through the standard stack so the timeout
//! supervisor, panic recovery and trace propagation can be exercised with
//! curl:
//!
//! ```text
//! GET /healthz          → 200 envelope
//! GET /slow?ms=N        → sleeps N ms, stops early if the deadline fires
//! GET /stream?ms=N      → long poll, exempt from the deadline via config
//! GET /panic            → handler panic, answered with the 500 envelope
//! GET /whoami           → echoes the gateway identity headers
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Extension, Query};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use service_common::config::loader::{load_config, resolve_path};
use service_common::config::ConfigWatcher;
use service_common::http::middleware::UserContext;
use service_common::http::{respond_success, DeadlineToken, HttpServer, RequestScope};
use service_common::lifecycle::{spawn_signal_handler, Shutdown};
use service_common::observability::{init_logging, metrics};

#[derive(Parser)]
#[command(name = "service-demo")]
#[command(about = "Demo service running the shared middleware stack", long_about = None)]
struct Cli {
    /// Config file. APP_CONFIG_PATH takes precedence when set.
    #[arg(short, long, default_value = "config/service.toml")]
    config: PathBuf,

    /// Reload the config file when it changes.
    #[arg(long)]
    watch: bool,
}

#[derive(Debug, Deserialize)]
struct DelayQuery {
    ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(Some(cli.config.as_path()))?;
    init_logging(&config.logging)?;

    tracing::info!(
        service = %config.trace.service_name,
        bind_address = %config.server.bind_address(),
        request_timeout_ms = config.timeout.request_ms,
        skip_paths = ?config.timeout.skip_paths,
        "Configuration loaded"
    );

    if config.metrics.enabled {
        metrics::init_metrics(config.metrics.address.parse()?)?;
    }

    let (_watch_handle, config_updates) = if cli.watch {
        let path = resolve_path(Some(cli.config.as_path()), &|key: &str| std::env::var(key).ok())
            .unwrap_or_else(|| cli.config.clone());
        let (watcher, updates) = ConfigWatcher::new(&path);
        (Some(watcher.run()?), updates)
    } else {
        let (_, updates) = mpsc::unbounded_channel();
        (None, updates)
    };

    let listener = TcpListener::bind(config.server.bind_address()).await?;
    let server = HttpServer::new(config, routes());

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn routes() -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/slow", get(slow))
        .route("/stream", get(long_poll))
        .route("/panic", get(panicking))
        .route("/whoami", get(whoami))
}

async fn healthz() -> Response {
    respond_success(json!({ "status": "ok" }), None)
}

async fn slow(
    Query(query): Query<DelayQuery>,
    Extension(DeadlineToken(deadline)): Extension<DeadlineToken>,
    Extension(scope): Extension<Arc<RequestScope>>,
) -> Response {
    let delay = Duration::from_millis(query.ms.unwrap_or(1_000));
    tokio::select! {
        _ = tokio::time::sleep(delay) => {}
        _ = deadline.cancelled() => {
            tracing::info!(delay_ms = delay.as_millis() as u64, "Slow handler stopped at deadline");
        }
    }
    if scope.is_aborted() {
        // The 504 is already out; skip building a body nobody will read.
        tracing::debug!("Slow handler skipping response, request aborted");
        return Response::default();
    }
    respond_success(json!({ "slept_ms": delay.as_millis() as u64 }), None)
}

async fn long_poll(Query(query): Query<DelayQuery>) -> Response {
    let delay = Duration::from_millis(query.ms.unwrap_or(2_000));
    tokio::time::sleep(delay).await;
    respond_success(json!({ "events": [] }), Some("poll complete"))
}

async fn panicking() -> Response {
    panic!("demo handler panic");
}

async fn whoami(user: UserContext) -> Response {
    respond_success(
        json!({
            "user_id": user.user_id,
            "role": user.user_role().map(|r| r.to_string()),
            "platform": user.client_platform().map(|p| p.to_string()),
        }),
        None,
    )
}
