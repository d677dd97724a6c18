//! Error taxonomy and the uniform error envelope.
//!
//! # Design Decisions
//! - Handlers return `ApiError`; its `IntoResponse` only sets the status and
//!   stashes the error in the response extensions
//! - The orchestrator renders every envelope, so each one carries the
//!   request id and respects the deployment mode
//! - Unauthorized responses never describe the expected credential

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::generator::{available_formats, GeneratorError, MAX_BULK_COUNT, MIN_BULK_COUNT};
use crate::pipeline::context::RateLimitStatus;

/// Message used for `Internal` failures in production.
pub const GENERIC_INTERNAL_MESSAGE: &str = "Internal server error";

/// A field-level input problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub location: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl FieldError {
    pub fn query(field: impl Into<String>, message: impl Into<String>, value: Option<String>) -> Self {
        Self {
            field: field.into(),
            location: "query",
            message: message.into(),
            value,
        }
    }
}

/// Every failure the service can report.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Invalid format. Available formats: {}", available_formats().join(", "))]
    InvalidFormat(String),

    #[error("Count must be between {} and {}", MIN_BULK_COUNT, MAX_BULK_COUNT)]
    InvalidCount(usize),

    #[error("Validation error")]
    ValidationFailed(Vec<FieldError>),

    #[error("Invalid or missing API key")]
    Unauthorized,

    #[error("Too many requests, please try again later")]
    RateLimitExceeded(RateLimitStatus),

    #[error("Route not found")]
    NotFound,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidFormat(_)
            | ApiError::InvalidCount(_)
            | ApiError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::RateLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Structured details for the envelope, if the kind carries any.
    pub fn details(&self) -> Option<Value> {
        match self {
            ApiError::InvalidFormat(value) => Some(json!({
                "field": "format",
                "value": value,
                "accepted": available_formats(),
            })),
            ApiError::InvalidCount(value) => Some(json!({
                "field": "count",
                "value": value,
                "min": MIN_BULK_COUNT,
                "max": MAX_BULK_COUNT,
            })),
            ApiError::ValidationFailed(errors) => serde_json::to_value(errors).ok(),
            ApiError::RateLimitExceeded(status) => Some(json!({
                "rate_limit_limit": status.limit,
                "rate_limit_remaining": status.remaining,
                "rate_limit_reset": crate::http::response::timestamp(status.reset_at),
            })),
            ApiError::Unauthorized | ApiError::NotFound | ApiError::Internal(_) => None,
        }
    }

    /// Render into the uniform envelope. `expose_internal` controls whether
    /// `Internal` messages reach the caller.
    pub fn envelope(&self, request_id: &str, expose_internal: bool) -> ErrorEnvelope {
        let error = match self {
            ApiError::Internal(_) if !expose_internal => GENERIC_INTERNAL_MESSAGE.to_string(),
            other => other.to_string(),
        };
        ErrorEnvelope {
            error,
            request_id: request_id.to_string(),
            details: self.details(),
        }
    }
}

impl From<GeneratorError> for ApiError {
    fn from(err: GeneratorError) -> Self {
        match err {
            GeneratorError::InvalidFormat(value) => ApiError::InvalidFormat(value),
            GeneratorError::InvalidCount(count) => ApiError::InvalidCount(count),
            other @ GeneratorError::InvalidComponent { .. } => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = self.status().into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// `{ error, request_id, details? }`
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}
