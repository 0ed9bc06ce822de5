//! Declarative fixed-width column codec.
//!
//! The model's reader is column-positional: every header and block line is
//! a sequence of fields with fixed widths. A layout is declared once as a
//! slice of [`ColumnSpec`] and consumed by the generic [`decode_line`] and
//! [`encode_line`] routines, so no record type carries its own format string.
//!
//! # Examples
//!
//! ```
//! use oprights::formats::primitives::fixed_width::{decode_line, encode_line, ColumnSpec, FieldValue};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! const LAYOUT: &[ColumnSpec] = &[
//!     ColumnSpec::text("id", 12),
//!     ColumnSpec::integer("switch", 8),
//!     ColumnSpec::skip(1),
//!     ColumnSpec::real("loss", 8),
//! ];
//!
//! let values = decode_line("Ditch_01           1     0.50", LAYOUT, 1)?;
//! assert_eq!(values[0], FieldValue::Text("Ditch_01".to_string()));
//! assert_eq!(values[1], FieldValue::Integer(1));
//! assert_eq!(values[2], FieldValue::Real(0.5));
//!
//! let line = encode_line(&values, LAYOUT, 2)?;
//! assert_eq!(line, "Ditch_01           1     0.50");
//! # Ok(())
//! # }
//! ```

use crate::error::{OprError, Result};
use crate::formats::primitives::fields::{format_real, parse_int, parse_real};

/// Value type of a fixed-width column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, trimmed on decode
    Text,
    /// Integer
    Integer,
    /// Integer written as a real with a forced trailing decimal point (`"  12."`)
    DecimalInteger,
    /// Real number written with the configured precision
    Real,
    /// Filler columns, ignored on decode and blank on encode
    Skip,
}

/// Justification of a value inside its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    /// Pad on the right
    Left,
    /// Pad on the left
    Right,
}

/// One column of a fixed-width layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Field name used in error messages
    pub name: &'static str,
    /// Width in characters
    pub width: usize,
    /// Value type
    pub kind: FieldKind,
    /// Justification on encode
    pub align: Align,
}

impl ColumnSpec {
    /// Left-justified text column.
    pub const fn text(name: &'static str, width: usize) -> Self {
        ColumnSpec { name, width, kind: FieldKind::Text, align: Align::Left }
    }

    /// Right-justified text column.
    pub const fn text_right(name: &'static str, width: usize) -> Self {
        ColumnSpec { name, width, kind: FieldKind::Text, align: Align::Right }
    }

    /// Right-justified integer column.
    pub const fn integer(name: &'static str, width: usize) -> Self {
        ColumnSpec { name, width, kind: FieldKind::Integer, align: Align::Right }
    }

    /// Integer column written as `"<n>."`.
    pub const fn decimal_integer(name: &'static str, width: usize) -> Self {
        ColumnSpec { name, width, kind: FieldKind::DecimalInteger, align: Align::Right }
    }

    /// Right-justified real column.
    pub const fn real(name: &'static str, width: usize) -> Self {
        ColumnSpec { name, width, kind: FieldKind::Real, align: Align::Right }
    }

    /// Filler columns.
    pub const fn skip(width: usize) -> Self {
        ColumnSpec { name: "", width, kind: FieldKind::Skip, align: Align::Left }
    }
}

/// A decoded column value. [`FieldKind::Skip`] columns produce no value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Text column
    Text(String),
    /// Integer or decimal-integer column
    Integer(i32),
    /// Real column
    Real(f64),
}

impl FieldValue {
    /// Consumes the value as text (numbers are rendered with `Display`).
    pub fn into_text(self) -> String {
        match self {
            FieldValue::Text(s) => s,
            FieldValue::Integer(v) => v.to_string(),
            FieldValue::Real(v) => v.to_string(),
        }
    }

    /// Returns the integer value, truncating reals.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            FieldValue::Real(v) => Some(*v as i32),
            FieldValue::Text(_) => None,
        }
    }

    /// Returns the real value.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Real(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }
}

/// Total width of a layout.
pub fn layout_width(layout: &[ColumnSpec]) -> usize {
    layout.iter().map(|c| c.width).sum()
}

/// Decodes a line against a layout.
///
/// Columns past the end of a short line decode as blank: empty text, or
/// the missing-value sentinel for numeric columns. Characters past the end
/// of the layout are ignored.
///
/// # Errors
///
/// Returns [`OprError::InvalidField`] when a numeric column holds text that
/// is not a number.
pub fn decode_line(line: &str, layout: &[ColumnSpec], line_number: usize) -> Result<Vec<FieldValue>> {
    let chars: Vec<char> = line.chars().collect();
    let mut values = Vec::with_capacity(layout.len());
    let mut pos = 0;

    for column in layout {
        let start = pos.min(chars.len());
        let end = (pos + column.width).min(chars.len());
        pos += column.width;

        if column.kind == FieldKind::Skip {
            continue;
        }

        let raw: String = chars[start..end].iter().collect();
        let value = match column.kind {
            FieldKind::Text => FieldValue::Text(raw.trim().to_string()),
            FieldKind::Integer | FieldKind::DecimalInteger => {
                FieldValue::Integer(parse_int(&raw, column.name, line_number)?)
            }
            FieldKind::Real => FieldValue::Real(parse_real(&raw, column.name, line_number)?),
            FieldKind::Skip => unreachable!("skip columns are filtered above"),
        };
        values.push(value);
    }

    Ok(values)
}

/// Encodes values against a layout.
///
/// `values` holds one entry per non-skip column, in layout order. Trailing
/// blanks are removed from the produced line. Real columns are written
/// with [`format_real`]: extra decimals when a value needs them, fewer when
/// the column is narrow.
///
/// # Errors
///
/// - [`OprError::FieldOverflow`] if a formatted value is wider than its column
/// - [`OprError::FieldCount`] if `values` is shorter than the layout requires
pub fn encode_line(values: &[FieldValue], layout: &[ColumnSpec], precision: usize) -> Result<String> {
    let mut line = String::with_capacity(layout_width(layout));
    let mut values_iter = values.iter();
    let needed = layout.iter().filter(|c| c.kind != FieldKind::Skip).count();

    for column in layout {
        if column.kind == FieldKind::Skip {
            line.extend(std::iter::repeat(' ').take(column.width));
            continue;
        }

        let value = values_iter.next().ok_or(OprError::FieldCount {
            expected: needed,
            actual: values.len(),
            line: 0,
        })?;
        let formatted = format_value(value, column, precision);
        if formatted.chars().count() > column.width {
            return Err(OprError::FieldOverflow {
                field: column.name.to_string(),
                width: column.width,
                value: formatted,
            });
        }

        let width = column.width;
        match column.align {
            Align::Left => line.push_str(&format!("{:<width$}", formatted)),
            Align::Right => line.push_str(&format!("{:>width$}", formatted)),
        }
    }

    let trimmed = line.trim_end().len();
    line.truncate(trimmed);
    Ok(line)
}

fn format_value(value: &FieldValue, column: &ColumnSpec, precision: usize) -> String {
    match (column.kind, value) {
        (FieldKind::DecimalInteger, v) => format!("{}.", v.as_int().unwrap_or_default()),
        (FieldKind::Real, v) => format_real(v.as_real().unwrap_or_default(), precision, column.width),
        (FieldKind::Integer, v) => v.as_int().unwrap_or_default().to_string(),
        (_, FieldValue::Text(s)) => s.clone(),
        (_, v) => v.clone().into_text(),
    }
}
