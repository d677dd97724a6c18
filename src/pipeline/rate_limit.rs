//! Rate-limit admission stage.

use chrono::TimeDelta;
use std::sync::Arc;

use crate::observability::metrics;
use crate::pipeline::context::{RateLimitStatus, RequestContext};
use crate::pipeline::error::ApiError;
use crate::pipeline::stage::{Outcome, Stage};
use crate::security::{Clock, CounterStore};

/// Counts the request against the client's window and records the quota
/// on the context, whether admitted or not.
#[derive(Debug, Clone)]
pub struct RateLimitStage {
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
    window: TimeDelta,
    limit: u64,
}

impl RateLimitStage {
    pub fn new(store: Arc<dyn CounterStore>, clock: Arc<dyn Clock>, window: TimeDelta, limit: u64) -> Self {
        Self {
            store,
            clock,
            window,
            limit,
        }
    }
}

impl Stage for RateLimitStage {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn attempt(&self, ctx: &mut RequestContext) -> Outcome {
        let key = ctx.client_key();
        let decision = self.store.hit(&key, self.clock.now(), self.window, self.limit);
        let status = RateLimitStatus {
            limit: decision.limit,
            remaining: decision.remaining,
            reset_at: decision.reset_at,
        };
        ctx.rate_limit = Some(status);

        if decision.admitted {
            Ok(())
        } else {
            tracing::warn!(request_id = %ctx.id, client = %key, "Rate limit exceeded");
            metrics::record_rate_limited();
            Err(ApiError::RateLimitExceeded(status))
        }
    }
}
