//! Number synthesis.
//!
//! # Responsibilities
//! - Pick an area code uniformly from the registry
//! - Synthesize an exchange whose first digit is never 0 or 1
//! - Synthesize a four digit line number
//! - Produce single numbers or bounded batches
//!
//! # Design Decisions
//! - `PhoneNumber` holds the components only; `formatted` is derived
//! - Batches are independent draws, duplicates are possible and allowed

use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::sync::Arc;

use crate::generator::area_codes::{is_valid_area_code, valid_area_codes};
use crate::generator::format::PhoneFormat;
use crate::generator::random::{RandomSource, ThreadRandom};
use crate::generator::GeneratorError;

/// Smallest accepted bulk count.
pub const MIN_BULK_COUNT: usize = 1;
/// Largest accepted bulk count.
pub const MAX_BULK_COUNT: usize = 1000;
/// Bulk count used when the caller supplies none.
pub const DEFAULT_BULK_COUNT: usize = 10;

/// An immutable synthesized phone number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber {
    area_code: String,
    exchange: String,
    line_number: String,
    format: PhoneFormat,
}

impl PhoneNumber {
    /// Build a number from raw components, checking the numbering shape.
    pub fn from_parts(
        area_code: impl Into<String>,
        exchange: impl Into<String>,
        line_number: impl Into<String>,
        format: PhoneFormat,
    ) -> Result<Self, GeneratorError> {
        let area_code = area_code.into();
        let exchange = exchange.into();
        let line_number = line_number.into();

        if !is_valid_area_code(&area_code) {
            return Err(GeneratorError::InvalidComponent {
                field: "area code",
                value: area_code,
            });
        }
        if !is_exchange(&exchange) {
            return Err(GeneratorError::InvalidComponent {
                field: "exchange",
                value: exchange,
            });
        }
        if line_number.len() != 4 || !all_digits(&line_number) {
            return Err(GeneratorError::InvalidComponent {
                field: "line number",
                value: line_number,
            });
        }

        Ok(Self {
            area_code,
            exchange,
            line_number,
            format,
        })
    }

    pub fn area_code(&self) -> &str {
        &self.area_code
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn line_number(&self) -> &str {
        &self.line_number
    }

    pub fn format(&self) -> PhoneFormat {
        self.format
    }

    /// The rendered number. Recomputed on every call from the components.
    pub fn formatted(&self) -> String {
        self.format
            .render(&self.area_code, &self.exchange, &self.line_number)
    }

    /// The same components rendered through another format.
    pub fn with_format(&self, format: PhoneFormat) -> Self {
        Self {
            format,
            ..self.clone()
        }
    }
}

impl Serialize for PhoneNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(serde::Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Raw<'a> {
            area_code: &'a str,
            exchange: &'a str,
            line_number: &'a str,
        }

        let mut state = serializer.serialize_struct("PhoneNumber", 3)?;
        state.serialize_field("formatted", &self.formatted())?;
        state.serialize_field(
            "raw",
            &Raw {
                area_code: &self.area_code,
                exchange: &self.exchange,
                line_number: &self.line_number,
            },
        )?;
        state.serialize_field("format", &self.format)?;
        state.end()
    }
}

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

fn is_exchange(s: &str) -> bool {
    s.len() == 3 && all_digits(s) && !s.starts_with(['0', '1'])
}

/// Generates phone numbers from an injected entropy source.
#[derive(Debug, Clone)]
pub struct PhoneNumberGenerator {
    source: Arc<dyn RandomSource>,
}

impl Default for PhoneNumberGenerator {
    fn default() -> Self {
        Self::new(Arc::new(ThreadRandom))
    }
}

impl PhoneNumberGenerator {
    pub fn new(source: Arc<dyn RandomSource>) -> Self {
        Self { source }
    }

    /// Generate one number in the given format.
    pub fn generate(&self, format: PhoneFormat) -> PhoneNumber {
        let codes = valid_area_codes();
        let area_code = codes[self.source.below(codes.len() as u32) as usize].to_string();

        // Exchange codes never start with 0 or 1
        let mut exchange = (self.source.below(8) + 2).to_string();
        exchange.push_str(&self.digits(2));

        let line_number = self.digits(4);

        PhoneNumber {
            area_code,
            exchange,
            line_number,
            format,
        }
    }

    /// Generate one number from an optional format name, defaulting to `plain`.
    pub fn generate_phone_number(&self, format: Option<&str>) -> Result<PhoneNumber, GeneratorError> {
        let format = match format {
            Some(name) => name.parse()?,
            None => PhoneFormat::default(),
        };
        Ok(self.generate(format))
    }

    /// Generate exactly `count` independent numbers.
    pub fn generate_multiple(
        &self,
        count: usize,
        format: PhoneFormat,
    ) -> Result<Vec<PhoneNumber>, GeneratorError> {
        if !(MIN_BULK_COUNT..=MAX_BULK_COUNT).contains(&count) {
            return Err(GeneratorError::InvalidCount(count));
        }
        Ok((0..count).map(|_| self.generate(format)).collect())
    }

    /// Batch variant of [`generate_phone_number`](Self::generate_phone_number).
    /// The count is checked before the format.
    pub fn generate_multiple_phone_numbers(
        &self,
        count: usize,
        format: Option<&str>,
    ) -> Result<Vec<PhoneNumber>, GeneratorError> {
        if !(MIN_BULK_COUNT..=MAX_BULK_COUNT).contains(&count) {
            return Err(GeneratorError::InvalidCount(count));
        }
        let format = match format {
            Some(name) => name.parse()?,
            None => PhoneFormat::default(),
        };
        self.generate_multiple(count, format)
    }

    fn digits(&self, len: usize) -> String {
        (0..len)
            .map(|_| char::from(b'0' + self.source.below(10) as u8))
            .collect()
    }
}
