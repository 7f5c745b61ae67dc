//! Structured logging.
//!
//! # Responsibilities
//! - Install the global `tracing` subscriber once at startup
//! - Route ERROR events to stderr and everything else to stdout
//!
//! # Design Decisions
//! - `RUST_LOG`, when set, wins over the configured level
//! - JSON for production, human-readable console output for development
//! - A bad level string fails startup instead of silently logging at info

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogEncoding, LoggingConfig};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("failed to install log subscriber: {0}")]
    Install(#[from] TryInitError),
}

/// Build the filter: `RUST_LOG` first, then the configured level.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(&config.level)?),
    }
}

pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = build_filter(config)?;
    let writer = std::io::stderr
        .with_max_level(Level::ERROR)
        .or_else(std::io::stdout);
    let registry = tracing_subscriber::registry().with(filter);

    match config.encoding {
        LogEncoding::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(writer),
            )
            .try_init()?,
        LogEncoding::Console => registry
            .with(fmt::layer().with_target(true).with_writer(writer))
            .try_init()?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_level_builds_filter() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig {
            level: "warn".to_string(),
            encoding: LogEncoding::Console,
        };
        let filter = build_filter(&config).unwrap();
        assert_eq!(filter.max_level_hint(), Some(tracing::level_filters::LevelFilter::WARN));
    }
}
