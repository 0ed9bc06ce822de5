//! Byte-level line decoding and encoding.
//!
//! Model files predate UTF-8 and often carry Latin-1 names and comments.
//! A line that is valid UTF-8 is read as such. Any other line is read as
//! Latin-1, which maps every byte to exactly one `char`, so decoding never
//! fails and writing the same text back as Latin-1 restores the bytes.
//!
//! # Examples
//!
//! ```
//! use oprights::formats::primitives::encoding::{decode_bytes, TextEncoding};
//!
//! # fn main() -> std::io::Result<()> {
//! let (text, encoding) = decode_bytes(b"# Ca\xf1on ditch\r\n");
//! assert_eq!(text, "# Ca\u{f1}on ditch");
//! assert_eq!(encoding, TextEncoding::Latin1);
//!
//! let mut out = Vec::new();
//! encoding.write_line(&mut out, &text)?;
//! assert_eq!(out, b"# Ca\xf1on ditch\n");
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Byte encoding of a text file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    /// UTF-8 (plain ASCII files are UTF-8)
    #[default]
    Utf8,
    /// ISO-8859-1, one byte per character
    Latin1,
}

/// Byte written in Latin-1 output for characters above U+00FF.
pub const LATIN1_REPLACEMENT: u8 = b'?';

impl TextEncoding {
    /// Writes `line` followed by a newline.
    pub fn write_line<W: Write>(self, writer: &mut W, line: &str) -> io::Result<()> {
        match self {
            TextEncoding::Utf8 => writeln!(writer, "{}", line),
            TextEncoding::Latin1 => {
                let bytes: Vec<u8> = line
                    .chars()
                    .map(|c| u8::try_from(u32::from(c)).unwrap_or(LATIN1_REPLACEMENT))
                    .collect();
                writer.write_all(&bytes)?;
                writer.write_all(b"\n")
            }
        }
    }
}

/// Strips trailing `\n` and `\r` bytes.
pub fn trim_line_ending(mut bytes: &[u8]) -> &[u8] {
    while let [rest @ .., b'\n' | b'\r'] = bytes {
        bytes = rest;
    }
    bytes
}

/// Decodes one raw line, line ending removed.
///
/// Returns the text and the encoding it was read with.
pub fn decode_bytes(bytes: &[u8]) -> (String, TextEncoding) {
    let bytes = trim_line_ending(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), TextEncoding::Utf8),
        Err(_) => (bytes.iter().copied().map(char::from).collect(), TextEncoding::Latin1),
    }
}
