//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (windows > 0, timeouts > 0)
//! - Reject unusable credentials and paths
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;

use crate::config::schema::ServiceConfig;

/// Largest accepted rate-limit window (one day).
pub const MAX_WINDOW_MS: u64 = 24 * 60 * 60 * 1000;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Check every semantic constraint, collecting all failures.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("not a socket address: {:?}", config.listener.bind_address),
        ));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new("listener.request_timeout_secs", "must be > 0"));
    }

    if config.auth.header.parse::<axum::http::HeaderName>().is_err() {
        errors.push(ValidationError::new(
            "auth.header",
            format!("not a valid header name: {:?}", config.auth.header),
        ));
    }
    if config.auth.api_keys.iter().any(|key| key.trim().is_empty()) {
        errors.push(ValidationError::new("auth.api_keys", "keys cannot be blank"));
    }

    let rate_limit = &config.rate_limit;
    if rate_limit.window_ms == 0 || rate_limit.window_ms > MAX_WINDOW_MS {
        errors.push(ValidationError::new(
            "rate_limit.window_ms",
            format!("must be between 1 and {MAX_WINDOW_MS}"),
        ));
    }
    if rate_limit.max_requests == 0 {
        errors.push(ValidationError::new("rate_limit.max_requests", "must be > 0"));
    }
    if rate_limit.prune_interval_secs == 0 {
        errors.push(ValidationError::new("rate_limit.prune_interval_secs", "must be > 0"));
    }

    for path in &config.admission.exempt_paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(
                "admission.exempt_paths",
                format!("path must start with '/': {path:?}"),
            ));
        }
    }

    let origin = &config.cors.allowed_origin;
    if origin != "*" && origin.parse::<axum::http::HeaderValue>().is_err() {
        errors.push(ValidationError::new(
            "cors.allowed_origin",
            format!("not a valid origin: {origin:?}"),
        ));
    }

    if config.observability.log_level.parse::<LevelFilter>().is_err() {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level {:?}", config.observability.log_level),
        ));
    }
    if config
        .observability
        .log_file
        .as_deref()
        .is_some_and(|path| path.trim().is_empty())
    {
        errors.push(ValidationError::new("observability.log_file", "path cannot be blank"));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("not a socket address: {:?}", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
