//! Shared-secret authentication gate.
//!
//! An empty key set means the deployment is open and the gate admits
//! everything. Otherwise the presented header must equal one configured key.

use std::collections::HashSet;

use crate::observability::metrics;
use crate::pipeline::context::RequestContext;
use crate::pipeline::error::ApiError;
use crate::pipeline::stage::{Outcome, Stage};

#[derive(Debug, Clone, Default)]
pub struct AuthStage {
    keys: HashSet<String>,
}

impl AuthStage {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Stage for AuthStage {
    fn name(&self) -> &'static str {
        "authenticate"
    }

    fn attempt(&self, ctx: &mut RequestContext) -> Outcome {
        if self.is_open() {
            return Ok(());
        }

        match ctx.credential() {
            Some(key) if self.keys.contains(key) => Ok(()),
            presented => {
                tracing::warn!(
                    request_id = %ctx.id,
                    path = %ctx.path,
                    credential_present = presented.is_some(),
                    "Authentication failed"
                );
                metrics::record_auth_failure();
                Err(ApiError::Unauthorized)
            }
        }
    }
}
