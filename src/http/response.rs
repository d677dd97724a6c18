//! Success envelopes.
//!
//! # Responsibilities
//! - Wrap handler payloads with the request id and a timestamp
//! - Report quota metadata on generation endpoints
//!
//! # Design Decisions
//! - Timestamps are RFC 3339 in UTC with millisecond precision
//! - Quota fields serialize as `null` when rate limiting is off

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::pipeline::{RateLimitStatus, RequestContext};

/// Render a timestamp the way every envelope does.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `{request_id, timestamp, data, metadata?}`
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub request_id: String,
    pub timestamp: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RateLimitMetadata>,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(ctx: &RequestContext, data: T) -> Self {
        Self {
            request_id: ctx.id.clone(),
            timestamp: timestamp(Utc::now()),
            data,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: RateLimitMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub rate_limit_remaining: Option<u64>,
    pub rate_limit_reset: Option<String>,
}

impl RateLimitMetadata {
    pub fn from_status(status: Option<RateLimitStatus>) -> Self {
        Self {
            count: None,
            rate_limit_remaining: status.map(|s| s.remaining),
            rate_limit_reset: status.map(|s| timestamp(s.reset_at)),
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
    pub timestamp: String,
    pub request_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormatsData {
    pub formats: Vec<&'static str>,
    pub examples: BTreeMap<&'static str, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AreaCodesData {
    pub area_codes: &'static [&'static str],
    pub count: usize,
}
