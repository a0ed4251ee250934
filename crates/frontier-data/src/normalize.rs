//! Value Normalizer
//!
//! Scraped statistics pages report numbers as display strings with magnitude
//! suffixes: `2.95T` market cap, `500K` volume, `26.31%` margin. This module
//! turns those strings into `f64`.
//!
//! Suffix multipliers:
//! - `T` = 1e12, `B` = 1e9, `M` = 1e6, `K`/`k` = 1e3
//! - `%` = 1 (the sign is stripped, `3.5%` stays `3.5`)

use crate::error::{DataError, Result};

/// Suffixes in detection order, with their multipliers.
const SUFFIXES: [(char, f64); 6] = [
    ('T', 1e12),
    ('B', 1e9),
    ('M', 1e6),
    ('K', 1e3),
    ('k', 1e3),
    ('%', 1.0),
];

/// A raw cell value as delivered by a scraper.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Already numeric
    Number(f64),
    /// Display text
    Text(String),
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Parse a raw value into a number.
///
/// Numbers are returned unchanged. Text is trimmed, thousands separators are
/// removed and at most one trailing suffix is consumed before the remainder
/// is parsed.
///
/// # Errors
///
/// Returns [`DataError::Parse`] when the remaining text is not a finite
/// number (`"n/a"`, `"--"`, empty cells).
///
/// # Examples
///
/// ```
/// use frontier_data::parse_value;
///
/// assert_eq!(parse_value("1.2T").unwrap(), 1.2e12);
/// assert_eq!(parse_value("3.5%").unwrap(), 3.5);
/// assert_eq!(parse_value(7.0).unwrap(), 7.0);
/// assert!(parse_value("n/a").is_err());
/// ```
pub fn parse_value(raw: impl Into<RawValue>) -> Result<f64> {
    match raw.into() {
        RawValue::Number(value) => Ok(value),
        RawValue::Text(text) => parse_text(&text),
    }
}

/// Parse a raw value, mapping failures to `None`.
///
/// Used by the ingestion layer, where an unparseable cell is a missing cell.
pub fn parse_optional(raw: impl Into<RawValue>) -> Option<f64> {
    parse_value(raw).ok()
}

fn parse_text(text: &str) -> Result<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();

    let (number, multiplier) = split_suffix(&cleaned);

    let value: f64 = number.trim().parse().map_err(|_| DataError::Parse {
        raw: text.to_string(),
        reason: "not a number".to_string(),
    })?;

    if !value.is_finite() {
        return Err(DataError::Parse {
            raw: text.to_string(),
            reason: "not a finite number".to_string(),
        });
    }

    Ok(value * multiplier)
}

/// Split a trailing magnitude suffix off the text.
fn split_suffix(text: &str) -> (&str, f64) {
    for (suffix, multiplier) in SUFFIXES {
        if let Some(stripped) = text.strip_suffix(suffix) {
            return (stripped, multiplier);
        }
    }
    (text, 1.0)
}
