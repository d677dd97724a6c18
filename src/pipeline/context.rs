//! Per-request context threaded through the pipeline.

use axum::http::{request::Parts, HeaderName, Method};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

/// Quota state reported by the rate limiter for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitStatus {
    pub limit: u64,
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitStatus {
    /// Whole seconds until the window resets, never negative.
    pub fn reset_after(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.reset_at - now).num_milliseconds().max(0) as u64;
        millis.div_ceil(1000)
    }
}

/// State owned by exactly one request.
///
/// Created when the request enters the pipeline, stamped with an id by the
/// identification stage, and dropped after the response is sent.
#[derive(Clone)]
pub struct RequestContext {
    pub id: String,
    pub started_at: Instant,
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub client_ip: Option<IpAddr>,
    pub user_agent: Option<String>,
    credential: Option<String>,
    pub rate_limit: Option<RateLimitStatus>,
}

impl RequestContext {
    /// Capture the inbound request. `credential_header` names the header
    /// carrying the client's shared secret.
    pub fn new(parts: &Parts, client: Option<SocketAddr>, credential_header: &HeaderName) -> Self {
        let header = |name: &HeaderName| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };

        Self {
            id: String::new(),
            started_at: Instant::now(),
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(String::from),
            client_ip: client.map(|addr| addr.ip()),
            user_agent: header(&axum::http::header::USER_AGENT),
            credential: header(credential_header),
            rate_limit: None,
        }
    }

    /// The secret presented by the caller, if any.
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// Key used to attribute requests to a client for rate limiting.
    pub fn client_key(&self) -> String {
        self.client_ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

// The credential never appears in logs or debug output
impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("client_ip", &self.client_ip)
            .field("user_agent", &self.user_agent)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}
