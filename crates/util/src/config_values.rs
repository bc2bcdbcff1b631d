//! # Configuration Value Coercion
//!
//! Flat configuration stores hand back raw strings. These helpers turn them
//! into typed values leniently: a value that cannot be interpreted comes back
//! as `None` and the caller picks the fallback.

use once_cell::sync::Lazy;
use regex::Regex;

const YES_OPTIONS: [&str; 3] = ["true", "on", "yes"];
const NO_OPTIONS: [&str; 3] = ["false", "off", "no"];

static NUMERIC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?\s*$").expect("numeric pattern compiles"));

/// Whether a raw value is a plain decimal number (optionally signed, optional exponent).
///
/// Special float spellings such as `inf` or `NaN` are not numeric.
pub fn is_numeric(raw: &str) -> bool {
    NUMERIC_PATTERN.is_match(raw)
}

/// Parse a raw value as a decimal number.
///
/// # Returns
/// `Some(f64)` for numeric input, otherwise `None`.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    if !is_numeric(raw) {
        return None;
    }
    raw.trim().parse::<f64>().ok()
}

/// Interpret a raw value as a boolean.
///
/// Numeric values are `true` when their integer part is positive. The words
/// `true`/`on`/`yes` and `false`/`off`/`no` are recognized case-insensitively.
/// Anything else returns `None` so callers can decide how loudly to fall back.
pub fn try_parse_boolean(raw: &str) -> Option<bool> {
    if let Some(value) = parse_decimal(raw) {
        return Some(value.trunc() as i64 > 0);
    }

    let normalized = raw.trim().to_ascii_lowercase();
    if YES_OPTIONS.contains(&normalized.as_str()) {
        return Some(true);
    }
    if NO_OPTIONS.contains(&normalized.as_str()) {
        return Some(false);
    }
    None
}
