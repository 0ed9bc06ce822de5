//! Line-level building blocks shared by the record codecs.
//!
//! - [`fixed_width`]: declarative column layouts and the generic
//!   fixed-width decoder/encoder
//! - [`free_format`]: whitespace-delimited value lists
//! - [`fields`]: typed field parsing with missing-value sentinels
//! - [`encoding`]: UTF-8 or Latin-1 line decoding
//! - [`header`]: comment attribution, format version detection, and the
//!   file-header seam used by the writer

pub mod encoding;
pub mod fields;
pub mod fixed_width;
pub mod free_format;
pub mod header;

pub use fixed_width::{decode_line, encode_line, Align, ColumnSpec, FieldKind, FieldValue};
pub use encoding::TextEncoding;
pub use header::{HeaderSource, PreservedHeader};

/// Reserved integer meaning "missing".
pub const MISSING_INT: i32 = -999;

/// Reserved real meaning "missing".
pub const MISSING_DOUBLE: f64 = -999.0;
