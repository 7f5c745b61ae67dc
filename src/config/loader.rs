//! Configuration loading.
//!
//! # Precedence
//! ```text
//! built-in defaults
//!     ← TOML file (APP_CONFIG_PATH, else the path given by the caller)
//!     ← environment overrides (SECTION_KEY, e.g. TIMEOUT_REQUEST_MS)
//! ```
//!
//! A missing file is not an error: services can run on defaults plus
//! environment alone. A file that exists but does not parse is.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml::{Table, Value};

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable that overrides any caller-supplied config path.
pub const CONFIG_PATH_ENV: &str = "APP_CONFIG_PATH";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to encode config defaults: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("environment override {key}={value:?} does not match the expected type")]
    Env { key: String, value: String },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration using the process environment.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    load_config_from(path, |key| std::env::var(key).ok())
}

/// Load configuration with an explicit environment lookup.
pub fn load_config_from<E>(path: Option<&Path>, env: E) -> Result<ServiceConfig, ConfigError>
where
    E: Fn(&str) -> Option<String>,
{
    let mut merged = Value::try_from(ServiceConfig::default())?;

    if let Some(path) = resolve_path(path, &env) {
        match fs::read_to_string(&path) {
            Ok(content) => {
                let file: Value = toml::from_str(&content)?;
                merge(&mut merged, file);
                tracing::info!(path = %path.display(), "Configuration file loaded");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(
                    path = %path.display(),
                    "Config file not found, using defaults and environment"
                );
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        }
    }

    if let Value::Table(table) = &mut merged {
        apply_env_overrides(table, "", &env)?;
    }

    let config: ServiceConfig = merged.try_into()?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// `APP_CONFIG_PATH` wins over the caller's path when set and non-empty.
pub fn resolve_path<E>(path: Option<&Path>, env: &E) -> Option<PathBuf>
where
    E: Fn(&str) -> Option<String>,
{
    env(CONFIG_PATH_ENV)
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| path.map(Path::to_path_buf))
}

fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Table(base), Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Replace every leaf whose `PREFIX_KEY` variable is set, parsing the value
/// as the type the leaf already has.
fn apply_env_overrides<E>(table: &mut Table, prefix: &str, env: &E) -> Result<(), ConfigError>
where
    E: Fn(&str) -> Option<String>,
{
    for (key, value) in table.iter_mut() {
        let name = if prefix.is_empty() {
            key.to_uppercase()
        } else {
            format!("{prefix}_{}", key.to_uppercase())
        };

        if let Value::Table(nested) = value {
            apply_env_overrides(nested, &name, env)?;
            continue;
        }

        let Some(raw) = env(&name) else {
            continue;
        };
        *value = parse_override(value, &raw).ok_or_else(|| ConfigError::Env {
            key: name.clone(),
            value: raw.clone(),
        })?;
        tracing::debug!(key = %name, "Applied environment override");
    }
    Ok(())
}

fn parse_override(current: &Value, raw: &str) -> Option<Value> {
    let raw = raw.trim();
    match current {
        Value::Boolean(_) => raw.parse().ok().map(Value::Boolean),
        Value::Integer(_) => raw.parse().ok().map(Value::Integer),
        Value::Float(_) => raw.parse().ok().map(Value::Float),
        Value::Array(_) => Some(Value::Array(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect(),
        )),
        _ => Some(Value::String(raw.to_string())),
    }
}
