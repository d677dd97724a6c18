//! Input validators for query parameters.
//!
//! Rules are declarative: each names a field, a predicate and a message.
//! Every rule runs; all failures are reported together. Absent fields are
//! never checked, since both parameters are optional.

use std::collections::HashMap;

use crate::generator::{
    is_valid_format, PhoneFormat, DEFAULT_BULK_COUNT, MAX_BULK_COUNT, MIN_BULK_COUNT,
};
use crate::pipeline::error::{ApiError, FieldError};

/// A constraint on one optional query parameter.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    check: fn(&str) -> bool,
    message: fn() -> String,
}

impl FieldRule {
    fn evaluate(&self, params: &HashMap<String, String>) -> Option<FieldError> {
        let value = params.get(self.field)?;
        if (self.check)(value) {
            None
        } else {
            Some(FieldError::query(self.field, (self.message)(), Some(value.clone())))
        }
    }
}

fn check_format(value: &str) -> bool {
    is_valid_format(Some(value))
}

fn format_message() -> String {
    ApiError::InvalidFormat(String::new()).to_string()
}

fn check_count(value: &str) -> bool {
    parse_count(value).is_some()
}

fn count_message() -> String {
    ApiError::InvalidCount(0).to_string()
}

/// Parse a count, accepting only integers inside the bulk bounds.
pub fn parse_count(value: &str) -> Option<usize> {
    value
        .parse::<i64>()
        .ok()
        .filter(|n| (MIN_BULK_COUNT as i64..=MAX_BULK_COUNT as i64).contains(n))
        .map(|n| n as usize)
}

pub const FORMAT_RULE: FieldRule = FieldRule {
    field: "format",
    check: check_format,
    message: format_message,
};

pub const COUNT_RULE: FieldRule = FieldRule {
    field: "count",
    check: check_count,
    message: count_message,
};

/// Rules for the single-number endpoint.
pub const PHONE_RULES: &[FieldRule] = &[FORMAT_RULE];

/// Rules for the bulk endpoint.
pub const BULK_RULES: &[FieldRule] = &[FORMAT_RULE, COUNT_RULE];

/// Evaluate every rule and fail with the complete list of problems.
pub fn validate(params: &HashMap<String, String>, rules: &[FieldRule]) -> Result<(), ApiError> {
    let errors: Vec<FieldError> = rules.iter().filter_map(|rule| rule.evaluate(params)).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::ValidationFailed(errors))
    }
}

/// Validated, typed parameters handed to handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhoneParams {
    pub format: PhoneFormat,
    pub count: usize,
}

impl PhoneParams {
    /// Validate `params` against `rules`, then coerce to typed values.
    /// Absent values take their defaults.
    pub fn from_query(params: &HashMap<String, String>, rules: &[FieldRule]) -> Result<Self, ApiError> {
        validate(params, rules)?;

        let format = match params.get("format") {
            Some(name) => name.parse::<PhoneFormat>()?,
            None => PhoneFormat::default(),
        };
        // Only reached once validation passed, so a present count parses
        // whenever the count rule applies
        let count = params
            .get("count")
            .and_then(|value| parse_count(value))
            .unwrap_or(DEFAULT_BULK_COUNT);

        Ok(Self { format, count })
    }
}
