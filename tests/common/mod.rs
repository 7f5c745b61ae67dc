//! Shared utilities for integration tests.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use service_common::http::middleware::UserContext;
use service_common::http::respond_success;
use service_common::ServiceConfig;

/// Config with a short deadline and `/stream` exempt.
#[allow(dead_code)]
pub fn test_config(timeout_ms: u64) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.timeout.request_ms = timeout_ms;
    config.timeout.skip_paths = vec!["/stream".to_string()];
    config.server.shutdown_grace_ms = 200;
    config
}

/// Routes with fixed behaviour relative to a 50ms deadline.
#[allow(dead_code)]
pub fn test_routes() -> Router {
    Router::new()
        .route("/fast", get(fast))
        .route("/slow", get(slow))
        .route("/stream", get(slow))
        .route("/panic", get(panics))
        .route("/whoami", get(whoami))
}

async fn fast() -> Response {
    tokio::time::sleep(Duration::from_millis(10)).await;
    respond_success(json!({ "handler": "fast" }), None)
}

async fn slow() -> Response {
    tokio::time::sleep(Duration::from_millis(200)).await;
    respond_success(json!({ "handler": "slow" }), None)
}

async fn panics() -> Response {
    tokio::time::sleep(Duration::from_millis(10)).await;
    panic!("boom");
}

async fn whoami(user: UserContext) -> Response {
    respond_success(
        json!({ "user_id": user.user_id, "role": user.user_role().map(|r| r.to_string()) }),
        None,
    )
}

#[allow(dead_code)]
pub fn get_request(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// One recorded log event.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
    pub fields: HashMap<String, String>,
}

/// In-memory `tracing` layer for asserting on log output.
#[derive(Clone, Default)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

#[allow(dead_code)]
impl LogCapture {
    /// Capture events on the current thread until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::set_default(subscriber)
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, message: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.message == message)
            .count()
    }

    pub fn find(&self, message: &str) -> Option<CapturedEvent> {
        self.events().into_iter().find(|e| e.message == message)
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: HashMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields
                .insert(field.name().to_string(), format!("{value:?}"));
        }
    }
}
