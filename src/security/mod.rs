//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Admission pipeline:
//!     → rate_limit.rs (per-client fixed-window counters)
//!         ↳ clock.rs (wall clock, mockable)
//! Outgoing response:
//!     → headers.rs (nosniff, frame denial, referrer policy)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a rejected admission never reaches a handler
//! - The counter store is a port so a shared backend can replace it

pub mod clock;
pub mod headers;
pub mod rate_limit;

pub use clock::{Clock, MockClock, SystemClock};
pub use headers::with_security_headers;
pub use rate_limit::{CounterStore, MemoryCounterStore, WindowDecision};
