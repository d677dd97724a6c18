//! Phone number generation engine.
//!
//! # Data Flow
//! ```text
//! format name (optional)
//!     → format.rs (closed enumeration, templates)
//!     → engine.rs (area code pick, exchange + line synthesis)
//!         ↳ random.rs (injected entropy source)
//!         ↳ area_codes.rs (fixed registry)
//!     → PhoneNumber (immutable value, rendered on demand)
//! ```
//!
//! # Design Decisions
//! - Area codes and formats are closed, in-memory enumerations
//! - Generation is O(1) per number and never blocks
//! - Randomness is a capability passed in, so tests can seed it
//! - `formatted` is always derived, never stored

pub mod area_codes;
pub mod engine;
pub mod format;
pub mod random;

use thiserror::Error;

pub use area_codes::{is_valid_area_code, valid_area_codes};
pub use engine::{PhoneNumber, PhoneNumberGenerator, DEFAULT_BULK_COUNT, MAX_BULK_COUNT, MIN_BULK_COUNT};
pub use format::{available_formats, is_valid_format, PhoneFormat};
pub use random::{RandomSource, SeededRandom, ThreadRandom};

/// Errors raised by the generation engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    /// Requested format is not one of the known formats.
    #[error("Invalid format specified: {0:?}")]
    InvalidFormat(String),

    /// Bulk count outside the accepted bounds.
    #[error("Count must be between {MIN_BULK_COUNT} and {MAX_BULK_COUNT}, got {0}")]
    InvalidCount(usize),

    /// A raw component does not satisfy the numbering shape.
    #[error("Invalid {field}: {value:?}")]
    InvalidComponent {
        field: &'static str,
        value: String,
    },
}
