//! Codec configuration.
//!
//! Two small structs travel with every read and write pass:
//!
//! - [`DatasetState`]: dataset-level switches that change which optional
//!   blocks a record carries. The decoder and encoder must agree on it.
//! - [`CodecOptions`]: output formatting knobs for the encoder.
//!
//! Both derive `serde` so a host application can embed them in its own
//! settings file.

use crate::formats::primitives::encoding::TextEncoding;
use serde::{Deserialize, Serialize};

/// Default number of decimals written for real-valued columns.
pub const DEFAULT_PRECISION: usize = 2;

/// Dataset-level state consulted by the block-enablement rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetState {
    /// Whether the dataset carries monthly efficiency blocks for rules whose
    /// secondary source names a structure account.
    pub monthly_efficiency: bool,
}

impl DatasetState {
    /// State with monthly efficiency blocks enabled.
    pub fn with_monthly_efficiency() -> Self {
        DatasetState {
            monthly_efficiency: true,
        }
    }
}

/// Output formatting options for the encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecOptions {
    /// Minimum decimals written for real-valued fields (loss, limit,
    /// monthly values). More are written when a value needs them to read
    /// back unchanged, fewer when a fixed column is too narrow.
    pub precision: usize,
    /// Byte encoding of the written file. Use the encoding reported by
    /// [`RightsParser::encoding`](crate::rights::RightsParser::encoding) to
    /// rewrite a Latin-1 file byte for byte.
    pub encoding: TextEncoding,
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecOptions {
            precision: DEFAULT_PRECISION,
            encoding: TextEncoding::Utf8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert!(!DatasetState::default().monthly_efficiency);
        assert!(DatasetState::with_monthly_efficiency().monthly_efficiency);
        assert_eq!(CodecOptions::default().precision, DEFAULT_PRECISION);
        assert_eq!(CodecOptions::default().encoding, TextEncoding::Utf8);
    }
}
