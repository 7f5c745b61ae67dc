//! Configuration validation.
//!
//! Semantic checks that serde cannot express. Returns every problem found,
//! not just the first, so one edit can fix a broken file.

use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.listen_addr.trim().is_empty() {
        errors.push(ValidationError::new("server.listen_addr", "must not be empty"));
    }
    if config.server.port == 0 {
        errors.push(ValidationError::new("server.port", "must be between 1 and 65535"));
    }

    if tracing::Level::from_str(&config.logging.level).is_err() {
        errors.push(ValidationError::new(
            "logging.level",
            format!(
                "unknown level {:?}, expected trace, debug, info, warn or error",
                config.logging.level
            ),
        ));
    }

    for prefix in &config.timeout.skip_paths {
        if !prefix.starts_with('/') {
            errors.push(ValidationError::new(
                "timeout.skip_paths",
                format!("{prefix:?} must start with '/'"),
            ));
        }
    }

    if config.metrics.enabled && config.metrics.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "metrics.address",
            format!("{:?} is not a socket address", config.metrics.address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ServiceConfig::default();
        config.server.port = 0;
        config.logging.level = "loud".to_string();
        config.timeout.skip_paths = vec!["stream".to_string()];
        config.metrics.enabled = true;
        config.metrics.address = "nowhere".to_string();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "server.port",
                "logging.level",
                "timeout.skip_paths",
                "metrics.address"
            ]
        );
    }

    #[test]
    fn test_metrics_address_ignored_when_disabled() {
        let mut config = ServiceConfig::default();
        config.metrics.address = "nowhere".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
