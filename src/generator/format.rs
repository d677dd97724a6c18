//! Output formats for rendered phone numbers.
//!
//! # Formats
//! - `plain`: `2125550123`
//! - `dashed`: `212-555-0123`
//! - `parentheses`: `(212) 555-0123`
//! - `dotted`: `212.555.0123`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::generator::GeneratorError;

/// Closed set of supported renderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhoneFormat {
    #[default]
    Plain,
    Dashed,
    Parentheses,
    Dotted,
}

impl PhoneFormat {
    /// Every format, in the stable order used for listings.
    pub const ALL: [PhoneFormat; 4] = [
        PhoneFormat::Plain,
        PhoneFormat::Dashed,
        PhoneFormat::Parentheses,
        PhoneFormat::Dotted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhoneFormat::Plain => "plain",
            PhoneFormat::Dashed => "dashed",
            PhoneFormat::Parentheses => "parentheses",
            PhoneFormat::Dotted => "dotted",
        }
    }

    /// Render the three numbering components through this format's template.
    pub fn render(&self, area_code: &str, exchange: &str, line_number: &str) -> String {
        match self {
            PhoneFormat::Plain => format!("{area_code}{exchange}{line_number}"),
            PhoneFormat::Dashed => format!("{area_code}-{exchange}-{line_number}"),
            PhoneFormat::Parentheses => format!("({area_code}) {exchange}-{line_number}"),
            PhoneFormat::Dotted => format!("{area_code}.{exchange}.{line_number}"),
        }
    }
}

impl fmt::Display for PhoneFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhoneFormat {
    type Err = GeneratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PhoneFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| GeneratorError::InvalidFormat(s.to_string()))
    }
}

/// Names of every supported format, in stable order.
pub fn available_formats() -> Vec<&'static str> {
    PhoneFormat::ALL.iter().map(PhoneFormat::as_str).collect()
}

/// Total predicate over optional input. Never fails; absent and empty
/// input are simply not valid.
pub fn is_valid_format(format: Option<&str>) -> bool {
    format.is_some_and(|name| name.parse::<PhoneFormat>().is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_templates() {
        assert_eq!(PhoneFormat::Plain.render("212", "555", "0123"), "2125550123");
        assert_eq!(PhoneFormat::Dashed.render("212", "555", "0123"), "212-555-0123");
        assert_eq!(
            PhoneFormat::Parentheses.render("212", "555", "0123"),
            "(212) 555-0123"
        );
        assert_eq!(PhoneFormat::Dotted.render("212", "555", "0123"), "212.555.0123");
    }

    #[test]
    fn test_available_formats_order() {
        assert_eq!(
            available_formats(),
            vec!["plain", "dashed", "parentheses", "dotted"]
        );
    }

    #[test]
    fn test_is_valid_format() {
        for name in ["plain", "dashed", "parentheses", "dotted"] {
            assert!(is_valid_format(Some(name)));
        }
        assert!(!is_valid_format(Some("invalid-format")));
        assert!(!is_valid_format(Some("")));
        assert!(!is_valid_format(Some("PLAIN")));
        assert!(!is_valid_format(None));
    }

    #[test]
    fn test_parse_unknown_format() {
        let err = "hex".parse::<PhoneFormat>().unwrap_err();
        assert_eq!(err, GeneratorError::InvalidFormat("hex".into()));
    }

    #[test]
    fn test_default_is_plain() {
        assert_eq!(PhoneFormat::default(), PhoneFormat::Plain);
    }
}
