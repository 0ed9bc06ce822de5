//! Streaming reader for operating-rule files.
//!
//! [`RightsParser`] yields one [`OperationalRight`] per record. Record
//! level problems never stop the stream: the record is logged, counted and
//! handed back as raw text so a later rewrite reproduces it unchanged.
//! Only I/O failures and an unsupported format version end the stream with
//! an error.
//!
//! # Examples
//!
//! ```
//! use oprights::config::DatasetState;
//! use oprights::rights::RightsParser;
//!
//! # fn main() -> oprights::Result<()> {
//! let data = "\
//! ## FileFormatVersion 2
//! ## EndHeader
//! ## Seasonal release
//! Release_01  Reoperation                  12345.00000     12.       1 Res_A              1 Res_B              1                    0      12
//!                                            1       1       1       1       1       1       0       0       0       0       1       1
//! ";
//!
//! let mut parser = RightsParser::new(data.as_bytes(), DatasetState::default());
//! let right = parser.next().unwrap()?;
//!
//! assert_eq!(right.id, "Release_01");
//! assert_eq!(right.comments, vec![" Seasonal release".to_string()]);
//! assert_eq!(right.monthly_switches().unwrap()[6], 0);
//! assert!(parser.next().is_none());
//! assert_eq!(parser.error_count(), 0);
//! # Ok(())
//! # }
//! ```

use crate::config::DatasetState;
use crate::error::{OprError, Result};
use crate::formats::primitives::encoding::{decode_bytes, TextEncoding};
use crate::formats::primitives::fields::parse_real;
use crate::formats::primitives::free_format::{parse_int_values, parse_values, split_tokens};
use crate::formats::primitives::header::{
    attribute_comments, detect_format_version, is_comment, COMMENT_PREFIX,
    SUPPORTED_FORMAT_VERSION,
};
use crate::formats::primitives::{decode_line, MISSING_INT};
use crate::rights::dumx::{self, MAX_INTERVENING, MONTHS};
use crate::rights::layout::{
    decode_header, decode_rio_grande, intervening_layout, ID_WIDTH, NO_ASSOCIATED_RULE,
};
use crate::rights::model::{
    InterveningStructure, OperationalRight, RuleBlocks, SanJuanValues, MONTHLY_MAX_ENTRIES,
};
use crate::rights::schema::RuleTypeDescriptor;
use flate2::read::MultiGzDecoder;
use log::{debug, info, trace, warn};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Streaming parser for operating-rule records.
pub struct RightsParser<R: Read> {
    reader: BufReader<R>,
    line_buf: Vec<u8>,
    line_number: usize,
    encoding: TextEncoding,
    pushed_back: Option<String>,
    pending_comments: Vec<String>,
    state: DatasetState,
    format_version: Option<u32>,
    records_read: usize,
    error_count: usize,
    finished: bool,
}

impl<R: Read> RightsParser<R> {
    /// Creates a parser over a reader.
    pub fn new(reader: R, state: DatasetState) -> Self {
        RightsParser {
            reader: BufReader::new(reader),
            line_buf: Vec::with_capacity(256),
            line_number: 0,
            encoding: TextEncoding::Utf8,
            pushed_back: None,
            pending_comments: Vec::new(),
            state,
            format_version: None,
            records_read: 0,
            error_count: 0,
            finished: false,
        }
    }

    /// Current line number (1-based).
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Records that could not be fully decoded so far.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Records yielded so far.
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Encoding of the lines read so far.
    ///
    /// [`TextEncoding::Latin1`] once any line was not valid UTF-8.
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Format version declared by the file, if one has been seen.
    pub fn format_version(&self) -> Option<u32> {
        self.format_version
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        if let Some(line) = self.pushed_back.take() {
            self.line_number += 1;
            return Ok(Some(line));
        }

        self.line_buf.clear();
        if self.reader.read_until(b'\n', &mut self.line_buf)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        let (line, encoding) = decode_bytes(&self.line_buf);
        if encoding == TextEncoding::Latin1 && self.encoding == TextEncoding::Utf8 {
            debug!("Line {} is not UTF-8, reading as Latin-1", self.line_number);
            self.encoding = TextEncoding::Latin1;
        }
        Ok(Some(line))
    }

    fn push_back(&mut self, line: String) {
        self.line_number -= 1;
        self.pushed_back = Some(line);
    }

    // Reads the next line of a data block. A line that starts in column one
    // belongs to the next record and is left for the outer loop.
    fn block_line(
        &mut self,
        block: &'static str,
        id: &str,
        consumed: &mut Vec<String>,
    ) -> Result<String> {
        match self.next_line()? {
            None => Err(OprError::UnexpectedEof {
                block,
                id: id.to_string(),
            }),
            Some(line) if starts_record(&line) => {
                let line_number = self.line_number;
                self.push_back(line);
                Err(OprError::MissingBlockLine {
                    block,
                    id: id.to_string(),
                    line: line_number,
                })
            }
            Some(line) => {
                consumed.push(line.clone());
                Ok(line)
            }
        }
    }

    // Appends indented and empty lines up to the next record or comment.
    fn collect_raw(&mut self, consumed: &mut Vec<String>) -> Result<()> {
        while let Some(line) = self.next_line()? {
            if starts_record(&line) {
                self.push_back(line);
                break;
            }
            consumed.push(line);
        }
        Ok(())
    }

    // Checks that no data line follows a structured record. Blank lines in
    // between are returned so a failed record keeps them.
    fn check_trailing(&mut self, id: &str) -> Result<Option<(OprError, Vec<String>)>> {
        let mut blanks = Vec::new();
        while let Some(line) = self.next_line()? {
            if starts_record(&line) {
                self.push_back(line);
                break;
            }
            if line.trim().is_empty() {
                blanks.push(line);
                continue;
            }
            let err = OprError::TrailingData {
                id: id.to_string(),
                line: self.line_number,
            };
            blanks.push(line);
            return Ok(Some((err, blanks)));
        }
        Ok(None)
    }

    fn read_record(&mut self, header_line: String) -> Result<OperationalRight> {
        let header_line_number = self.line_number;
        let comments = attribute_comments(std::mem::take(&mut self.pending_comments));
        let mut consumed = vec![header_line];

        let mut right = match decode_header(&consumed[0], header_line_number) {
            Ok(right) => right,
            Err(e) => {
                let err = OprError::MalformedHeader {
                    line: header_line_number,
                    reason: e.to_string(),
                };
                let id: String = consumed[0].chars().take(ID_WIDTH).collect();
                let mut right = OperationalRight::new(id.trim(), MISSING_INT);
                right.comments = comments;
                return self.fail_record(right, err, consumed);
            }
        };
        right.comments = comments;
        trace!(
            "Decoded header of right '{}' (type {}, dumx {}) at line {}",
            right.id,
            right.rule_type(),
            right.dumx(),
            header_line_number
        );

        let descriptor = match right.descriptor() {
            Some(d) if d.fully_understood => d,
            _ => {
                debug!(
                    "Right '{}' has rule type {} with no structured layout, keeping raw text",
                    right.id,
                    right.rule_type()
                );
                self.collect_raw(&mut consumed)?;
                right.set_raw_lines(consumed);
                return Ok(right);
            }
        };

        match self.read_blocks(&mut right, descriptor, &mut consumed) {
            Ok(blocks) => right.set_blocks(blocks),
            Err(e @ OprError::Io(_)) => return Err(e),
            Err(e) => return self.fail_record(right, e, consumed),
        }

        match self.check_trailing(&right.id)? {
            None => Ok(right),
            Some((e, extra)) => {
                consumed.extend(extra);
                self.fail_record(right, e, consumed)
            }
        }
    }

    fn fail_record(
        &mut self,
        mut right: OperationalRight,
        err: OprError,
        mut consumed: Vec<String>,
    ) -> Result<OperationalRight> {
        warn!("Could not decode right '{}': {}", right.id, err);
        self.error_count += 1;
        self.collect_raw(&mut consumed)?;
        debug!(
            "Keeping right '{}' as {} raw line(s)",
            right.id,
            consumed.len()
        );
        right.set_raw_lines(consumed);
        Ok(right)
    }

    fn read_blocks(
        &mut self,
        right: &mut OperationalRight,
        descriptor: &RuleTypeDescriptor,
        consumed: &mut Vec<String>,
    ) -> Result<RuleBlocks> {
        let id = right.id.clone();
        let mut blocks = RuleBlocks::default();

        if descriptor.uses_rio_grande() {
            let line = self.block_line("Rio Grande", &id, consumed)?;
            let (values, sources) = decode_rio_grande(&line, self.line_number)?;
            blocks.rio_grande = values;
            for (slot, source) in right.sources[2..].iter_mut().zip(sources) {
                *slot = source;
            }
        }

        if descriptor.uses_san_juan() {
            let line = self.block_line("San Juan", &id, consumed)?;
            let values: Vec<f64> = parse_values(&line, 2, "San Juan value", self.line_number)?;
            blocks.san_juan = SanJuanValues {
                min_content: values[0],
                release: values[1],
            };
        }

        let counts = dumx::decode(right.dumx(), right.rule_type());
        // Types without intervening blocks ignore the structure count
        let structure_count = if descriptor.supports_intervening() {
            counts.structure_count
        } else {
            0
        };
        if structure_count > MAX_INTERVENING {
            return Err(OprError::TooManyStructures {
                id,
                count: structure_count,
                max: MAX_INTERVENING,
            });
        }

        if descriptor.uses_monthly_switch() && counts.switch_count > 0 {
            let line = self.block_line("monthly switch", &id, consumed)?;
            let values = parse_int_values(&line, MONTHS, "monthly switch", self.line_number)?;
            let mut switches = [0; MONTHS];
            switches.copy_from_slice(&values);
            blocks.monthly_switches = Some(switches);
        }

        if descriptor.uses_associated_rule(right.limit) {
            let line = self.block_line("associated rule", &id, consumed)?;
            let token = split_tokens(&line).first().copied().ok_or(OprError::FieldCount {
                expected: 1,
                actual: 0,
                line: self.line_number,
            })?;
            if token != NO_ASSOCIATED_RULE {
                blocks.associated_rule = token.to_string();
            }
        }

        if structure_count > 0 && descriptor.uses_intervening_without_loss(right.conveyance_loss) {
            let line = self.block_line("intervening structure", &id, consumed)?;
            let layout = intervening_layout(structure_count);
            blocks.intervening = decode_line(&line, layout, self.line_number)?
                .into_iter()
                .map(|v| InterveningStructure::new(v.into_text()))
                .collect();
        }

        if structure_count > 0 && descriptor.uses_intervening_with_loss(right.conveyance_loss) {
            for _ in 0..structure_count {
                let line = self.block_line("intervening structure with loss", &id, consumed)?;
                blocks.intervening.push(parse_lossy_structure(&line, self.line_number)?);
            }
        }

        if descriptor.uses_monthly_max(right.limit) {
            for i in 0..MONTHLY_MAX_ENTRIES {
                let line = self.block_line("monthly maximum", &id, consumed)?;
                let values: Vec<f64> = parse_values(&line, 1, "monthly maximum", self.line_number)?;
                blocks.monthly_max[i] = values[0];
            }
        }

        let source2 = right.source2();
        if descriptor.uses_monthly_efficiency(&self.state, &source2.id, source2.account) {
            for i in 0..MONTHS {
                let line = self.block_line("monthly efficiency", &id, consumed)?;
                let values: Vec<f64> = parse_values(&line, 1, "monthly efficiency", self.line_number)?;
                blocks.monthly_efficiency[i] = values[0];
            }
        }

        Ok(blocks)
    }
}

impl RightsParser<File> {
    /// Opens an uncompressed operating-rule file.
    pub fn from_path(path: impl AsRef<Path>, state: DatasetState) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file, state))
    }
}

impl RightsParser<MultiGzDecoder<File>> {
    /// Opens a gzip-compressed operating-rule file.
    pub fn from_gzip_path(path: impl AsRef<Path>, state: DatasetState) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(MultiGzDecoder::new(file), state))
    }
}

impl<R: Read> Iterator for RightsParser<R> {
    type Item = Result<OperationalRight>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = self.next_record();
        match &result {
            Some(Ok(_)) => self.records_read += 1,
            Some(Err(_)) | None => self.finished = true,
        }
        result
    }
}

impl<R: Read> RightsParser<R> {
    fn next_record(&mut self) -> Option<Result<OperationalRight>> {
        loop {
            let line = match self.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    if !self.pending_comments.is_empty() {
                        debug!(
                            "Dropping {} comment line(s) after the last record",
                            self.pending_comments.len()
                        );
                        self.pending_comments.clear();
                    }
                    return None;
                }
                Err(e) => return Some(Err(e)),
            };

            if line.trim().is_empty() {
                continue;
            }

            if is_comment(&line) {
                let text = &line[COMMENT_PREFIX.len_utf8()..];
                if let Some(version) = detect_format_version(text) {
                    if version != SUPPORTED_FORMAT_VERSION {
                        return Some(Err(OprError::UnsupportedVersion(version)));
                    }
                    self.format_version = Some(version);
                }
                self.pending_comments.push(text.to_string());
                continue;
            }

            if !starts_record(&line) {
                warn!(
                    "Skipping indented line {} that follows no record",
                    self.line_number
                );
                self.error_count += 1;
                continue;
            }

            return Some(self.read_record(line));
        }
    }
}

fn starts_record(line: &str) -> bool {
    line.chars().next().is_some_and(|c| !c.is_whitespace())
}

fn parse_lossy_structure(line: &str, line_number: usize) -> Result<InterveningStructure> {
    let tokens = split_tokens(line);
    if tokens.len() < 2 {
        return Err(OprError::FieldCount {
            expected: 2,
            actual: tokens.len(),
            line: line_number,
        });
    }
    let loss = parse_real(tokens[1], "intervening loss", line_number)?;
    let kind = tokens.get(2).copied().unwrap_or_default();
    Ok(InterveningStructure::with_loss(tokens[0], loss, kind))
}

/// Reads every right in a file.
///
/// Files ending in `.gz` are decompressed while reading.
///
/// # Errors
///
/// I/O failures and unsupported format versions are returned as is. If any
/// record could not be fully decoded, returns [`OprError::RecordErrors`]
/// holding the error count and every right read, raw-text fallbacks
/// included.
pub fn read_rights(path: impl AsRef<Path>, state: &DatasetState) -> Result<Vec<OperationalRight>> {
    let path = path.as_ref();
    info!("Reading operating rights from {}", path.display());

    let is_gzip = path.extension().is_some_and(|ext| ext == "gz");
    let (rights, error_count, encoding) = if is_gzip {
        collect_rights(RightsParser::from_gzip_path(path, state.clone())?)?
    } else {
        collect_rights(RightsParser::from_path(path, state.clone())?)?
    };

    info!(
        "Read {} operating right(s) from {} ({} with errors)",
        rights.len(),
        path.display(),
        error_count
    );
    if encoding == TextEncoding::Latin1 {
        info!(
            "{} is not UTF-8 and was read as Latin-1; write it back with TextEncoding::Latin1 to keep its bytes",
            path.display()
        );
    }

    if error_count > 0 {
        return Err(OprError::RecordErrors {
            path: path.to_path_buf(),
            count: error_count,
            rights,
        });
    }
    Ok(rights)
}

fn collect_rights<R: Read>(
    mut parser: RightsParser<R>,
) -> Result<(Vec<OperationalRight>, usize, TextEncoding)> {
    let rights = parser.by_ref().collect::<Result<Vec<_>>>()?;
    Ok((rights, parser.error_count(), parser.encoding()))
}
