//! Field parsing utilities shared by the fixed-width and free-format codecs.
//!
//! Legacy model files mark a missing number by leaving its columns blank.
//! These helpers resolve blanks to the reserved sentinels
//! ([`MISSING_INT`], [`MISSING_DOUBLE`]) instead of failing, and convert
//! everything else with line-numbered errors.
//!
//! # Examples
//!
//! ```
//! use oprights::formats::primitives::fields::{parse_int, parse_real, round_half_away};
//! use oprights::formats::primitives::{MISSING_DOUBLE, MISSING_INT};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! assert_eq!(parse_int("   42", "on/off", 1)?, 42);
//! assert_eq!(parse_int("     ", "on/off", 1)?, MISSING_INT);
//! assert_eq!(parse_real("  0.25", "loss", 1)?, 0.25);
//! assert_eq!(parse_real("", "loss", 1)?, MISSING_DOUBLE);
//! assert_eq!(round_half_away(-14.5), -15);
//! # Ok(())
//! # }
//! ```

use crate::error::{OprError, Result};
use crate::formats::primitives::{MISSING_DOUBLE, MISSING_INT};
use std::str::FromStr;

/// Parses a required field with type conversion.
///
/// # Errors
///
/// Returns [`OprError::InvalidField`] if parsing fails.
pub fn parse_required<T: FromStr>(field: &str, field_name: &str, line: usize) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    field.trim().parse().map_err(|e: T::Err| OprError::InvalidField {
        field: field_name.to_string(),
        line,
        reason: e.to_string(),
    })
}

/// Parses an integer field; a blank field resolves to [`MISSING_INT`].
///
/// Integers written with a decimal point (`"12."`, `"3.0"`) are accepted
/// and rounded half away from zero, matching how the legacy reader treats
/// real-formatted integer columns.
pub fn parse_int(field: &str, field_name: &str, line: usize) -> Result<i32> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Ok(MISSING_INT);
    }

    if let Ok(value) = trimmed.parse::<i32>() {
        return Ok(value);
    }

    let real: f64 = parse_required(trimmed, field_name, line)?;
    if !real.is_finite() || real.abs() > i32::MAX as f64 {
        return Err(OprError::InvalidField {
            field: field_name.to_string(),
            line,
            reason: format!("{} is out of integer range", trimmed),
        });
    }
    Ok(round_half_away(real))
}

/// Parses a real field; a blank field resolves to [`MISSING_DOUBLE`].
pub fn parse_real(field: &str, field_name: &str, line: usize) -> Result<f64> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Ok(MISSING_DOUBLE);
    }
    parse_required(trimmed, field_name, line)
}

/// Most decimals [`format_real`] adds to make a value read back unchanged.
pub const MAX_DECIMALS: usize = 8;

/// Formats a real with at least `precision` decimals, in at most `width`
/// characters where possible.
///
/// Decimals are added, up to [`MAX_DECIMALS`], until the text parses back
/// to `value`. If the text is then wider than `width`, decimals are dropped
/// down to none; the caller decides what to do with a value that still
/// does not fit.
///
/// ```
/// use oprights::formats::primitives::fields::format_real;
///
/// assert_eq!(format_real(0.5, 2, 8), "0.50");
/// assert_eq!(format_real(0.125, 2, 8), "0.125");
/// assert_eq!(format_real(250000.0, 2, 8), "250000.0");
/// assert_eq!(format_real(12345678.0, 2, 8), "12345678");
/// ```
pub fn format_real(value: f64, precision: usize, width: usize) -> String {
    let mut decimals = precision;
    let mut text = format!("{:.decimals$}", value);
    while decimals < MAX_DECIMALS && text.parse::<f64>().ok() != Some(value) {
        decimals += 1;
        text = format!("{:.decimals$}", value);
    }
    while decimals > 0 && text.chars().count() > width {
        decimals -= 1;
        text = format!("{:.decimals$}", value);
    }
    text
}

/// Rounds to the nearest integer, halves away from zero.
pub fn round_half_away(value: f64) -> i32 {
    // f64::round already rounds half away from zero
    value.round() as i32
}

/// True for the integer sentinel.
pub fn is_missing_int(value: i32) -> bool {
    value == MISSING_INT
}

/// True for the real sentinel (or any value within rounding of it).
pub fn is_missing_real(value: f64) -> bool {
    (value - MISSING_DOUBLE).abs() < 0.001
}

/// True when an identifier field carries no usable id.
///
/// Blank, `0` and `NA` are all used by the model for "no structure".
pub fn is_blank_id(id: &str) -> bool {
    let id = id.trim();
    id.is_empty() || id == "0" || id.eq_ignore_ascii_case("NA")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_required_valid() {
        let result: i32 = parse_required(" 12345 ", "test", 1).unwrap();
        assert_eq!(result, 12345);

        let result: f64 = parse_required("2.75", "test", 1).unwrap();
        assert_eq!(result, 2.75);
    }

    #[test]
    fn test_parse_required_invalid() {
        let result: Result<i32> = parse_required("abc", "test", 4);
        match result {
            Err(OprError::InvalidField { field, line, .. }) => {
                assert_eq!(field, "test");
                assert_eq!(line, 4);
            }
            _ => panic!("Expected InvalidField error"),
        }
    }

    #[test]
    fn test_parse_int_missing() {
        assert_eq!(parse_int("", "test", 1).unwrap(), MISSING_INT);
        assert_eq!(parse_int("        ", "test", 1).unwrap(), MISSING_INT);
    }

    #[test]
    fn test_parse_int_decimal_forms() {
        assert_eq!(parse_int("  12.", "dumx", 1).unwrap(), 12);
        assert_eq!(parse_int(" -15.", "dumx", 1).unwrap(), -15);
        assert_eq!(parse_int("2.5", "dumx", 1).unwrap(), 3);
        assert_eq!(parse_int("-2.5", "dumx", 1).unwrap(), -3);
    }

    #[test]
    fn test_parse_int_invalid() {
        assert!(parse_int("twelve", "dumx", 1).is_err());
        assert!(parse_int("1e20", "dumx", 1).is_err());
    }

    #[test]
    fn test_parse_real() {
        assert_eq!(parse_real(" 0.5 ", "loss", 1).unwrap(), 0.5);
        assert_eq!(parse_real("   ", "loss", 1).unwrap(), MISSING_DOUBLE);
        assert!(parse_real("x", "loss", 1).is_err());
    }

    #[test]
    fn test_format_real_keeps_decimals() {
        assert_eq!(format_real(1.5, 2, 8), "1.50");
        assert_eq!(format_real(0.125, 2, 8), "0.125");
        assert_eq!(format_real(-999.0, 2, 8), "-999.00");
        assert_eq!(format_real(0.0, 1, 8), "0.0");
        assert_eq!(format_real(2.5, 2, usize::MAX), "2.50");
    }

    #[test]
    fn test_format_real_narrows_to_fit() {
        assert_eq!(format_real(250000.0, 2, 8), "250000.0");
        assert_eq!(format_real(9999999.0, 2, 8), "9999999");
        assert_eq!(format_real(123456789.0, 2, 8), "123456789");
        assert_eq!(format_real(1.0 / 3.0, 2, 8), "0.333333");
    }

    #[test]
    fn test_round_half_away() {
        assert_eq!(round_half_away(0.5), 1);
        assert_eq!(round_half_away(-0.5), -1);
        assert_eq!(round_half_away(-20.0), -20);
        assert_eq!(round_half_away(11.49), 11);
    }

    #[test]
    fn test_missing_and_blank() {
        assert!(is_missing_int(MISSING_INT));
        assert!(!is_missing_int(0));
        assert!(is_missing_real(-999.0));
        assert!(!is_missing_real(0.0));
        assert!(is_blank_id("   "));
        assert!(is_blank_id("0"));
        assert!(is_blank_id("na"));
        assert!(!is_blank_id("Plan_01"));
    }
}
