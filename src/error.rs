//! Error types for oprights

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::rights::OperationalRight;

/// Result type alias for oprights operations
pub type Result<T> = std::result::Result<T, OprError>;

/// Errors that can occur while reading or writing operating-rule files.
///
/// Per-record decode failures are not returned from the parser directly.
/// They are logged, counted, and the affected record is kept in raw-text
/// form; [`OprError::RecordErrors`] reports the total after a full pass.
#[derive(Debug, Error)]
pub enum OprError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A field could not be converted to its column type
    #[error("Invalid value for field '{field}' at line {line}: {reason}")]
    InvalidField {
        /// Field name
        field: String,
        /// Line number (1-based)
        line: usize,
        /// Parse failure description
        reason: String,
    },

    /// A free-format line held fewer tokens than required
    #[error("Expected at least {expected} values at line {line}, found {actual}")]
    FieldCount {
        /// Minimum number of tokens
        expected: usize,
        /// Number of tokens found
        actual: usize,
        /// Line number (1-based)
        line: usize,
    },

    /// The header line of a record could not be decoded
    #[error("Malformed header at line {line}: {reason}")]
    MalformedHeader {
        /// Line number (1-based)
        line: usize,
        /// Error description
        reason: String,
    },

    /// The file ended inside a record
    #[error("Unexpected end of file while reading {block} for right '{id}'")]
    UnexpectedEof {
        /// Block being read
        block: &'static str,
        /// Identifier of the right being decoded
        id: String,
    },

    /// A data block line was expected but the next line starts a new record
    #[error("Missing {block} line for right '{id}' at line {line}")]
    MissingBlockLine {
        /// Block being read
        block: &'static str,
        /// Identifier of the right being decoded
        id: String,
        /// Line number of the unexpected line (1-based)
        line: usize,
    },

    /// An indented data line follows a record whose enabled blocks are complete
    #[error("Unexpected data line {line} after right '{id}'")]
    TrailingData {
        /// Identifier of the right
        id: String,
        /// Line number of the extra line (1-based)
        line: usize,
    },

    /// More intervening structures than the format can carry
    #[error("Right '{id}' has {count} intervening structures (maximum {max})")]
    TooManyStructures {
        /// Identifier of the right
        id: String,
        /// Structure count requested
        count: usize,
        /// Format maximum
        max: usize,
    },

    /// The file declares a format version this crate does not read
    #[error("Unsupported operating-rule file format version {0} (only version 2 is supported)")]
    UnsupportedVersion(u32),

    /// A structured right carries a rule type with no implemented layout
    #[error("Rule type {rule_type} of right '{id}' has no structured layout")]
    UnsupportedRuleType {
        /// Identifier of the right
        id: String,
        /// Rule type number
        rule_type: i32,
    },

    /// A value does not fit its fixed-width column
    #[error("Value '{value}' for field '{field}' does not fit in {width} columns")]
    FieldOverflow {
        /// Field name
        field: String,
        /// Column width
        width: usize,
        /// Formatted value
        value: String,
    },

    /// One or more records failed to decode during a full read pass
    #[error("{count} operating rule record(s) in {} could not be fully decoded", .path.display())]
    RecordErrors {
        /// File that was read
        path: PathBuf,
        /// Number of records with errors
        count: usize,
        /// Every record read, including best-effort raw-text ones
        rights: Vec<OperationalRight>,
    },
}
