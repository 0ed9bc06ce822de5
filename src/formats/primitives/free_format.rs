//! Whitespace-delimited ("free format") line codec.
//!
//! Several optional blocks are read list-directed: values are separated by
//! any run of blanks and their column position does not matter. They are
//! still written in fixed columns so the output stays aligned with the
//! rest of the file.
//!
//! # Examples
//!
//! ```
//! use oprights::formats::primitives::free_format::{encode_ints, parse_values};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let switches: Vec<i32> = parse_values("   1 1 0   0 1 1 1 1 1 1 1 1", 12, "monthly switch", 5)?;
//! assert_eq!(switches.len(), 12);
//! assert_eq!(switches[2], 0);
//!
//! let line = encode_ints(4, &[1, 0]);
//! assert_eq!(line, "           1       0");
//! # Ok(())
//! # }
//! ```

use crate::error::{OprError, Result};
use crate::formats::primitives::fields::format_real;
use std::fmt::Display;
use std::str::FromStr;

/// Column width of each value written by the encoders.
pub const VALUE_WIDTH: usize = 8;

/// Splits a line into whitespace-delimited tokens.
pub fn split_tokens(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Parses the first `expected` tokens of a line.
///
/// Extra tokens are ignored, the way a list-directed read ignores the rest
/// of its record.
///
/// # Errors
///
/// - [`OprError::FieldCount`] if fewer than `expected` tokens are present
/// - [`OprError::InvalidField`] if a token does not convert
pub fn parse_values<T: FromStr>(
    line: &str,
    expected: usize,
    field_name: &str,
    line_number: usize,
) -> Result<Vec<T>>
where
    T::Err: Display,
{
    let tokens = split_tokens(line);
    if tokens.len() < expected {
        return Err(OprError::FieldCount {
            expected,
            actual: tokens.len(),
            line: line_number,
        });
    }

    tokens
        .iter()
        .take(expected)
        .enumerate()
        .map(|(i, token)| {
            token.parse().map_err(|e: T::Err| OprError::InvalidField {
                field: format!("{} {}", field_name, i + 1),
                line: line_number,
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Parses a free-format integer token; real-formatted integers are rounded.
pub fn parse_int_token(token: &str, field_name: &str, line_number: usize) -> Result<i32> {
    crate::formats::primitives::fields::parse_int(token, field_name, line_number)
}

/// Parses the first `expected` tokens as integers.
///
/// Unlike [`parse_values`], tokens written as reals (`"1."`) are accepted.
pub fn parse_int_values(
    line: &str,
    expected: usize,
    field_name: &str,
    line_number: usize,
) -> Result<Vec<i32>> {
    let tokens = split_tokens(line);
    if tokens.len() < expected {
        return Err(OprError::FieldCount {
            expected,
            actual: tokens.len(),
            line: line_number,
        });
    }

    tokens
        .iter()
        .take(expected)
        .enumerate()
        .map(|(i, token)| parse_int_token(token, &format!("{} {}", field_name, i + 1), line_number))
        .collect()
}

/// Writes integers after `indent` blanks, one [`VALUE_WIDTH`] column each.
pub fn encode_ints(indent: usize, values: &[i32]) -> String {
    let mut line = " ".repeat(indent);
    for value in values {
        push_value(&mut line, &value.to_string());
    }
    line
}

/// Writes reals after `indent` blanks, one [`VALUE_WIDTH`] column each.
///
/// At least `precision` decimals, more when a value needs them to read
/// back unchanged.
pub fn encode_reals(indent: usize, values: &[f64], precision: usize) -> String {
    let mut line = " ".repeat(indent);
    for value in values {
        push_value(&mut line, &format_real(*value, precision, usize::MAX));
    }
    line
}

/// Writes text tokens after `indent` blanks, each left-justified in `width`
/// columns and separated by one blank.
pub fn encode_tokens(indent: usize, tokens: &[&str], width: usize) -> String {
    let mut line = " ".repeat(indent);
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        line.push_str(&format!("{:<width$}", token));
    }
    line.truncate(line.trim_end().len());
    line
}

// Values wider than the column still get a separating blank so the line
// stays tokenizable.
fn push_value(line: &mut String, formatted: &str) {
    if formatted.len() >= VALUE_WIDTH {
        line.push(' ');
        line.push_str(formatted);
    } else {
        line.push_str(&format!("{:>width$}", formatted, width = VALUE_WIDTH));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_tokens() {
        assert_eq!(split_tokens("  a  b\tc "), vec!["a", "b", "c"]);
        assert!(split_tokens("    ").is_empty());
    }

    #[test]
    fn test_parse_values_exact() {
        let values: Vec<f64> = parse_values("  1.5   2.0", 2, "value", 1).unwrap();
        assert_eq!(values, vec![1.5, 2.0]);
    }

    #[test]
    fn test_parse_values_ignores_extra() {
        let values: Vec<i32> = parse_values("1 2 3 4", 2, "value", 1).unwrap();
        assert_eq!(values, vec![1, 2]);
    }

    #[test]
    fn test_parse_values_too_few() {
        let result: Result<Vec<i32>> = parse_values("1 2", 12, "monthly switch", 8);
        match result {
            Err(OprError::FieldCount { expected, actual, line }) => {
                assert_eq!(expected, 12);
                assert_eq!(actual, 2);
                assert_eq!(line, 8);
            }
            other => panic!("Expected FieldCount, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_values_invalid_token() {
        let result: Result<Vec<i32>> = parse_values("1 x", 2, "monthly switch", 3);
        match result {
            Err(OprError::InvalidField { field, .. }) => assert_eq!(field, "monthly switch 2"),
            other => panic!("Expected InvalidField, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_int_token() {
        assert_eq!(parse_int_token("3.", "n", 1).unwrap(), 3);
    }

    #[test]
    fn test_parse_int_values_accepts_reals() {
        let values = parse_int_values(" 1. 0 1.0 -3", 4, "switch", 2).unwrap();
        assert_eq!(values, vec![1, 0, 1, -3]);

        match parse_int_values("1 on", 2, "switch", 2) {
            Err(OprError::InvalidField { field, .. }) => assert_eq!(field, "switch 2"),
            other => panic!("Expected InvalidField, got {:?}", other),
        }
    }

    #[test]
    fn test_encode_ints_and_reals() {
        assert_eq!(encode_ints(0, &[1, -999]), "       1    -999");
        assert_eq!(encode_reals(2, &[1.5], 2), "      1.50");
        assert_eq!(encode_reals(0, &[-999.0], 2), " -999.00");
    }

    #[test]
    fn test_encode_wide_value_stays_separated() {
        let line = encode_reals(0, &[123456.789, 1.0], 3);
        let tokens = split_tokens(&line);
        assert_eq!(tokens, vec!["123456.789", "1.000"]);
    }

    #[test]
    fn test_encode_tokens() {
        assert_eq!(encode_tokens(2, &["Ditch", "0.5", "Carrier"], 6), "  Ditch  0.5    Carrier");
    }
}
