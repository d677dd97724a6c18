//! Request pipeline.
//!
//! Every request walks the same state machine:
//!
//! ```text
//! ENTERED -> IDENTIFIED -> AUTHENTICATED -> ADMITTED -> VALIDATED -> HANDLED -> RESPONDED
//!               |               |              |            |           |
//!               +---------------+--------------+------------+-----------+--> ERRORED -> RESPONDED
//! ```
//!
//! Identification always runs. Authentication and rate limiting are gate
//! stages and are skipped for exempt paths. Validation runs inside the
//! handlers against per-endpoint rule lists.

pub mod auth;
pub mod context;
pub mod error;
pub mod identify;
pub mod orchestrator;
pub mod rate_limit;
pub mod stage;
pub mod validation;

pub use auth::AuthStage;
pub use context::{RateLimitStatus, RequestContext};
pub use error::{ApiError, ErrorEnvelope, FieldError, GENERIC_INTERNAL_MESSAGE};
pub use identify::IdentifyStage;
pub use orchestrator::{orchestrate, Pipeline, PipelineBuilder, X_REQUEST_ID};
pub use rate_limit::RateLimitStage;
pub use stage::{Outcome, Stage};
pub use validation::{PhoneParams, BULK_RULES, PHONE_RULES};
