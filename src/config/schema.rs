//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files and
//! carry defaults, so an empty file (or no file) is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for a service.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener settings.
    pub server: ServerConfig,

    /// Log level and encoding.
    pub logging: LoggingConfig,

    /// Trace context propagation.
    pub trace: TraceConfig,

    /// Request deadline enforcement.
    pub timeout: TimeoutConfig,

    /// Prometheus exporter.
    pub metrics: MetricsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub listen_addr: String,

    pub port: u16,

    /// How long in-flight requests may keep running after shutdown starts
    /// before their scopes are cancelled.
    pub shutdown_grace_ms: u64,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listen_addr, self.port)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_grace_ms: 10_000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogEncoding {
    #[default]
    Json,
    Console,
}

/// Logger configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level: trace, debug, info, warn, error.
    pub level: String,

    pub encoding: LogEncoding,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            encoding: LogEncoding::Json,
        }
    }
}

/// Trace context settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TraceConfig {
    /// Logged at startup and attached to the server span.
    pub service_name: String,

    /// Echo the trace id back in `X-Trace-Id`.
    pub expose_trace_header: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            service_name: env!("CARGO_PKG_NAME").to_string(),
            expose_trace_header: true,
        }
    }
}

/// Request deadline configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-request deadline in milliseconds. 0 disables enforcement.
    pub request_ms: u64,

    /// Path prefixes exempt from the deadline (streams, long polls).
    pub skip_paths: Vec<String>,
}

impl TimeoutConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_ms)
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.skip_paths
            .iter()
            .any(|prefix| !prefix.is_empty() && path.starts_with(prefix.as_str()))
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_ms: 30_000,
            skip_paths: Vec::new(),
        }
    }
}

/// Metrics exporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,

    /// Prometheus scrape address (e.g., "0.0.0.0:9090").
    pub address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: ServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.timeout.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_partial_section() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [logging]
            encoding = "console"

            [timeout]
            skip_paths = ["/stream", "/ws"]
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.encoding, LogEncoding::Console);
        assert_eq!(config.logging.level, "info");
        assert!(config.timeout.is_exempt("/stream/events"));
        assert!(!config.timeout.is_exempt("/posts"));
    }

    #[test]
    fn test_empty_prefix_never_matches() {
        let timeout = TimeoutConfig {
            request_ms: 10,
            skip_paths: vec![String::new()],
        };
        assert!(!timeout.is_exempt("/anything"));
    }
}
