//! The stage contract shared by every admission step.

use crate::pipeline::context::RequestContext;
use crate::pipeline::error::ApiError;

/// Either continue to the next stage or stop with a failure.
pub type Outcome = Result<(), ApiError>;

/// One step of the admission chain.
///
/// Stages run in a fixed order for every request. A stage may record state
/// on the context for later stages and handlers; it never writes to the
/// response directly.
pub trait Stage: Send + Sync + 'static {
    /// Unique name used in logs.
    fn name(&self) -> &'static str;

    /// Whether requests to exempt paths skip this stage.
    fn is_gate(&self) -> bool {
        true
    }

    fn attempt(&self, ctx: &mut RequestContext) -> Outcome;
}
