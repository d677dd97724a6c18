//! Configuration loading from disk and environment.

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {reason}")]
    InvalidEnv { var: &'static str, reason: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, then `.env` and process
/// environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ServiceConfig::default(),
    };

    // A missing .env file is not an error
    let _ = dotenvy::dotenv();
    apply_env_overrides(&mut config, |var| env::var(var).ok())?;

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply environment overrides read through `lookup`.
///
/// Recognised variables: `PORT`, `APP_ENV`, `RATE_LIMIT_WINDOW` (ms),
/// `RATE_LIMIT_MAX`, `API_KEYS` (comma separated), `CORS_ORIGIN`,
/// `LOG_FILE` (empty disables), `LOG_LEVEL`, `LOG_FORMAT`.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup("PORT") {
        let port: u16 = parse_var("PORT", &port)?;
        config.listener.bind_address = match config.listener.bind_address.parse::<SocketAddr>() {
            Ok(mut addr) => {
                addr.set_port(port);
                addr.to_string()
            }
            Err(_) => format!("0.0.0.0:{port}"),
        };
    }

    if let Some(environment) = lookup("APP_ENV") {
        config.environment = environment
            .parse()
            .map_err(|reason| ConfigError::InvalidEnv { var: "APP_ENV", reason })?;
    }

    if let Some(window) = lookup("RATE_LIMIT_WINDOW") {
        config.rate_limit.window_ms = parse_var("RATE_LIMIT_WINDOW", &window)?;
    }

    if let Some(max) = lookup("RATE_LIMIT_MAX") {
        config.rate_limit.max_requests = parse_var("RATE_LIMIT_MAX", &max)?;
    }

    if let Some(keys) = lookup("API_KEYS") {
        config.auth.api_keys = keys
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(String::from)
            .collect();
    }

    if let Some(origin) = lookup("CORS_ORIGIN") {
        config.cors.allowed_origin = origin;
    }

    if let Some(file) = lookup("LOG_FILE") {
        let file = file.trim();
        config.observability.log_file = (!file.is_empty()).then(|| file.to_string());
    }

    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level;
    }

    if let Some(format) = lookup("LOG_FORMAT") {
        config.observability.log_format = match format.to_ascii_lowercase().as_str() {
            "json" => crate::config::LogFormat::Json,
            "pretty" => crate::config::LogFormat::Pretty,
            other => {
                return Err(ConfigError::InvalidEnv {
                    var: "LOG_FORMAT",
                    reason: format!("expected json or pretty, got {other:?}"),
                })
            }
        };
    } else if config.environment.is_production() {
        config.observability.log_format = crate::config::LogFormat::Json;
    }

    Ok(())
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        reason: format!("Must be a positive number, got: {value}"),
    })
}
