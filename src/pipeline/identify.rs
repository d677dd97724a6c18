//! Request identification.

use uuid::Uuid;

use crate::pipeline::context::RequestContext;
use crate::pipeline::stage::{Outcome, Stage};

/// Stamps a fresh id on the context and logs the inbound request.
/// Never fails and is never skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentifyStage;

impl Stage for IdentifyStage {
    fn name(&self) -> &'static str {
        "identify"
    }

    fn is_gate(&self) -> bool {
        false
    }

    fn attempt(&self, ctx: &mut RequestContext) -> Outcome {
        ctx.id = Uuid::new_v4().to_string();

        tracing::info!(
            request_id = %ctx.id,
            method = %ctx.method,
            path = %ctx.path,
            query = ctx.query.as_deref().unwrap_or(""),
            client_ip = %ctx.client_key(),
            user_agent = ctx.user_agent.as_deref().unwrap_or(""),
            "Incoming request"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, Request};

    fn ctx() -> RequestContext {
        let (parts, _) = Request::builder().uri("/health").body(()).unwrap().into_parts();
        RequestContext::new(&parts, None, &HeaderName::from_static("x-api-key"))
    }

    #[test]
    fn test_assigns_unique_ids() {
        let mut a = ctx();
        let mut b = ctx();
        IdentifyStage.attempt(&mut a).unwrap();
        IdentifyStage.attempt(&mut b).unwrap();

        assert!(Uuid::parse_str(&a.id).is_ok());
        assert_ne!(a.id, b.id);
        assert!(!IdentifyStage.is_gate());
    }
}
