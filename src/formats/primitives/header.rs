//! File header and comment line handling.
//!
//! Operating-rule files open with a block of `#` comment lines (the file
//! header), and any record may be preceded by its own comment lines. Both
//! use the same prefix, so the reader has to decide which comments belong
//! to the file and which to the next record:
//!
//! - A line containing an end-of-header marker ([`END_HEADER_MARKERS`])
//!   closes the file header. Everything at or before the last such line is
//!   file-level and is dropped from the record's comments.
//! - A line containing [`FORMAT_VERSION_MARKER`] declares the file format
//!   version and is never attached to a record.
//!
//! The file header itself is carried across a rewrite by a [`HeaderSource`].
//! [`PreservedHeader`] keeps the original file's header lines.
//!
//! # Examples
//!
//! ```
//! use oprights::formats::primitives::header::{attribute_comments, detect_format_version};
//!
//! let pending = vec![
//!     " FileFormatVersion 2".to_string(),
//!     " EndHeader".to_string(),
//!     "> Senior call on the main stem".to_string(),
//! ];
//! assert_eq!(detect_format_version(&pending[0]), Some(2));
//! assert_eq!(attribute_comments(pending), vec!["> Senior call on the main stem".to_string()]);
//! ```

use crate::error::Result;
use crate::formats::primitives::encoding::decode_bytes;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Prefix of every comment line.
pub const COMMENT_PREFIX: char = '#';

/// Substrings that close the file header.
///
/// `EndHeader` is written by this crate; the dashed ruler ending in `e` is
/// the column guide that closes headers written by the model's own tools.
pub const END_HEADER_MARKERS: &[&str] = &["EndHeader", "-----e"];

/// Substring that introduces the format version declaration.
pub const FORMAT_VERSION_MARKER: &str = "FileFormatVersion";

/// The only format version this crate reads and writes.
pub const SUPPORTED_FORMAT_VERSION: u32 = 2;

/// Header line written when the preserved header carries no end marker.
pub const END_HEADER_LINE: &str = "# EndHeader";

/// Returns true for a comment line.
pub fn is_comment(line: &str) -> bool {
    line.starts_with(COMMENT_PREFIX)
}

/// Returns true when the comment text closes the file header.
pub fn is_end_of_header(text: &str) -> bool {
    END_HEADER_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Extracts the declared format version from a comment, if it declares one.
///
/// Works on full lines (`# FileFormatVersion 2`) and on comment text with
/// the prefix already removed.
pub fn detect_format_version(text: &str) -> Option<u32> {
    let pos = text.find(FORMAT_VERSION_MARKER)?;
    text[pos + FORMAT_VERSION_MARKER.len()..]
        .split_whitespace()
        .next()
        .and_then(|token| token.trim_matches(|c: char| !c.is_ascii_digit()).parse().ok())
}

/// Selects the comments that belong to the next record.
///
/// `pending` holds comment text (prefix removed) in file order. Comments at
/// or before the last end-of-header marker belong to the file header and
/// are discarded, as are version declarations.
pub fn attribute_comments(mut pending: Vec<String>) -> Vec<String> {
    if let Some(last_marker) = pending.iter().rposition(|c| is_end_of_header(c)) {
        pending.drain(..=last_marker);
    }
    pending.retain(|c| !c.contains(FORMAT_VERSION_MARKER));
    pending
}

/// Supplies the file-level header lines written before the first record.
///
/// Lines are returned verbatim, including their `#` prefix.
pub trait HeaderSource {
    /// Returns the header lines to write.
    fn header_lines(&self) -> Result<Vec<String>>;
}

/// A header carried over from an existing operating-rule file.
///
/// # Examples
///
/// ```
/// use oprights::formats::primitives::header::{HeaderSource, PreservedHeader};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let data = "# FileFormatVersion 2\n# Basin rules\n# EndHeader\n# first right\nR1 ...\n";
/// let header = PreservedHeader::from_reader(data.as_bytes())?;
///
/// assert_eq!(header.header_lines()?, vec![
///     "# FileFormatVersion 2".to_string(),
///     "# Basin rules".to_string(),
///     "# EndHeader".to_string(),
/// ]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreservedHeader {
    lines: Vec<String>,
}

impl PreservedHeader {
    /// An empty header.
    pub fn empty() -> Self {
        PreservedHeader::default()
    }

    /// Uses the given lines as the header.
    pub fn from_lines(lines: Vec<String>) -> Self {
        PreservedHeader { lines }
    }

    /// Reads the header of an existing file.
    ///
    /// A missing file yields an empty header, so a first write needs no
    /// special casing.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        match File::open(path) {
            Ok(file) => Self::from_reader(file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::empty()),
            Err(e) => Err(e.into()),
        }
    }

    /// Reads the header from the start of a stream.
    ///
    /// Collects the leading comment lines and keeps those up to and
    /// including the last end-of-header marker. Comments after that marker
    /// belong to the first record and are left to the record reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = BufReader::new(reader);
        let mut comments = Vec::new();
        let mut line_buf = Vec::new();

        loop {
            line_buf.clear();
            if reader.read_until(b'\n', &mut line_buf)? == 0 {
                break;
            }

            let (line, _) = decode_bytes(&line_buf);
            if line.trim().is_empty() {
                continue;
            }
            if !is_comment(&line) {
                break;
            }
            comments.push(line);
        }

        let keep = comments
            .iter()
            .rposition(|line| is_end_of_header(line))
            .map_or(0, |pos| pos + 1);
        comments.truncate(keep);

        Ok(PreservedHeader { lines: comments })
    }

    /// Whether the header declares a format version.
    pub fn declares_version(&self) -> bool {
        self.lines.iter().any(|l| detect_format_version(l).is_some())
    }

    /// Whether the header ends with an end-of-header marker.
    pub fn has_end_marker(&self) -> bool {
        self.lines.iter().any(|l| is_end_of_header(l))
    }
}

impl HeaderSource for PreservedHeader {
    fn header_lines(&self) -> Result<Vec<String>> {
        Ok(self.lines.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format_version() {
        assert_eq!(detect_format_version("# FileFormatVersion 2"), Some(2));
        assert_eq!(detect_format_version(" FileFormatVersion  1"), Some(1));
        assert_eq!(detect_format_version("# FileFormatVersion"), None);
        assert_eq!(detect_format_version("# just a comment"), None);
    }

    #[test]
    fn test_attribute_comments_no_marker() {
        let pending = vec![" one".to_string(), " two".to_string()];
        assert_eq!(attribute_comments(pending.clone()), pending);
    }

    #[test]
    fn test_attribute_comments_last_marker_wins() {
        let pending = vec![
            " header".to_string(),
            "-----e-----b-----e".to_string(),
            " more header".to_string(),
            " EndHeader".to_string(),
            " belongs to record".to_string(),
        ];
        assert_eq!(attribute_comments(pending), vec![" belongs to record".to_string()]);
    }

    #[test]
    fn test_attribute_comments_marker_is_last_line() {
        let pending = vec![" a".to_string(), " EndHeader".to_string()];
        assert!(attribute_comments(pending).is_empty());
    }

    #[test]
    fn test_attribute_comments_drops_version() {
        let pending = vec![" FileFormatVersion 2".to_string(), "> keep".to_string()];
        assert_eq!(attribute_comments(pending), vec!["> keep".to_string()]);
    }

    #[test]
    fn test_preserved_header_without_marker_is_empty() {
        let data = "# comment one\n# comment two\nR1\n";
        let header = PreservedHeader::from_reader(data.as_bytes()).unwrap();
        assert!(header.header_lines().unwrap().is_empty());
        assert!(!header.has_end_marker());
    }

    #[test]
    fn test_preserved_header_skips_blank_lines() {
        let data = "# FileFormatVersion 2\n\n# EndHeader\n";
        let header = PreservedHeader::from_reader(data.as_bytes()).unwrap();
        assert_eq!(header.header_lines().unwrap().len(), 2);
        assert!(header.declares_version());
        assert!(header.has_end_marker());
    }

    #[test]
    fn test_preserved_header_latin1() {
        let data = b"# Ca\xf1on basin\n# EndHeader\nR1\n";
        let header = PreservedHeader::from_reader(&data[..]).unwrap();
        assert_eq!(
            header.header_lines().unwrap(),
            vec!["# Ca\u{f1}on basin".to_string(), "# EndHeader".to_string()]
        );
    }

    #[test]
    fn test_preserved_header_missing_file() {
        let header = PreservedHeader::from_path("/nonexistent/dir/rights.opr").unwrap();
        assert_eq!(header, PreservedHeader::empty());
    }

    #[test]
    fn test_is_comment() {
        assert!(is_comment("# x"));
        assert!(is_comment("#> permanent"));
        assert!(!is_comment(" # indented"));
    }
}
