//! # oprights
//!
//! Reader and writer for the operating-rule records of a legacy
//! water-allocation model's fixed-column input files.
//!
//! Each record is a header line followed by optional data blocks whose
//! presence depends on the rule type, on a packed count column and on
//! dataset-wide settings. Records of rule types with no implemented layout,
//! and records that fail to decode, are carried as raw text and written
//! back unchanged.
//!
//! ## Quick start
//!
//! ```no_run
//! use oprights::config::{CodecOptions, DatasetState};
//! use oprights::formats::primitives::PreservedHeader;
//! use oprights::rights::{read_rights, write_rights};
//!
//! # fn main() -> oprights::Result<()> {
//! let state = DatasetState::default();
//! let mut rights = read_rights("basin.opr", &state)?;
//! rights.sort();
//!
//! let header = PreservedHeader::from_path("basin.opr")?;
//! write_rights(&header, "basin_sorted.opr", &rights, &[], &state, &CodecOptions::default())?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod formats;
pub mod rights;

pub use config::{CodecOptions, DatasetState};
pub use error::{OprError, Result};
pub use formats::primitives::TextEncoding;
pub use rights::{read_rights, write_rights, OperationalRight, RightsParser, RightsWriter};
