//! Writer for operating-rule files.
//!
//! [`RightsWriter`] emits the file header once and then one block of lines
//! per right. Structured rights are re-encoded from their fields; raw-text
//! rights are written back exactly as read.
//!
//! # Examples
//!
//! ```no_run
//! use oprights::config::{CodecOptions, DatasetState};
//! use oprights::formats::primitives::PreservedHeader;
//! use oprights::rights::{read_rights, write_rights};
//!
//! # fn main() -> oprights::Result<()> {
//! let state = DatasetState::default();
//! let rights = read_rights("basin.opr", &state)?;
//!
//! let header = PreservedHeader::from_path("basin.opr")?;
//! write_rights(&header, "basin.opr", &rights, &[], &state, &CodecOptions::default())?;
//! # Ok(())
//! # }
//! ```

use crate::config::{CodecOptions, DatasetState};
use crate::error::{OprError, Result};
use crate::formats::primitives::fields::format_real;
use crate::formats::primitives::free_format::{encode_ints, encode_reals, encode_tokens};
use crate::formats::primitives::header::{
    detect_format_version, is_comment, is_end_of_header, HeaderSource, COMMENT_PREFIX,
    END_HEADER_LINE, FORMAT_VERSION_MARKER, SUPPORTED_FORMAT_VERSION,
};
use crate::formats::primitives::encode_line;
use crate::formats::primitives::FieldValue;
use crate::rights::dumx;
use crate::rights::layout::{
    encode_header, encode_rio_grande, intervening_layout, CONTINUATION_INDENT, ID_WIDTH,
    NO_ASSOCIATED_RULE,
};
use crate::rights::model::{OperationalRight, RightBody, RuleBlocks};
use crate::rights::schema::{self, RuleTypeDescriptor};
use log::{info, warn};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writer for operating-rule records.
///
/// Buffered; call [`RightsWriter::finish`] to flush.
pub struct RightsWriter<W: Write> {
    writer: BufWriter<W>,
    state: DatasetState,
    options: CodecOptions,
    records_written: usize,
}

impl<W: Write> RightsWriter<W> {
    /// Creates a writer over any sink.
    pub fn new(sink: W, state: DatasetState, options: CodecOptions) -> Self {
        RightsWriter {
            writer: BufWriter::new(sink),
            state,
            options,
            records_written: 0,
        }
    }

    /// Writes the file header.
    ///
    /// Order: the format version line (unless `header_lines` declares one),
    /// `extra_comments`, `header_lines` verbatim, and an end-of-header line
    /// unless `header_lines` already has a marker. Extra comments that lack
    /// the `#` prefix get one.
    pub fn write_header(&mut self, header_lines: &[String], extra_comments: &[String]) -> Result<()> {
        if !header_lines.iter().any(|l| detect_format_version(l).is_some()) {
            let version = format!(
                "{} {} {}",
                COMMENT_PREFIX, FORMAT_VERSION_MARKER, SUPPORTED_FORMAT_VERSION
            );
            self.write_line(&version)?;
        }

        for comment in extra_comments {
            if is_comment(comment) {
                self.write_line(comment)?;
            } else {
                self.write_line(&format!("{} {}", COMMENT_PREFIX, comment))?;
            }
        }

        for line in header_lines {
            self.write_line(line)?;
        }

        if !header_lines.iter().any(|l| is_end_of_header(l)) {
            self.write_line(END_HEADER_LINE)?;
        }
        Ok(())
    }

    /// Writes one right: its comments, then its lines.
    ///
    /// # Errors
    ///
    /// - [`OprError::UnsupportedRuleType`] for a structured right whose rule
    ///   type has no layout
    /// - [`OprError::FieldOverflow`] if a value does not fit its column
    pub fn write_right(&mut self, right: &OperationalRight) -> Result<()> {
        let lines = encode_right(right, &self.state, &self.options)?;
        for comment in &right.comments {
            self.write_line(&format!("{}{}", COMMENT_PREFIX, comment))?;
        }
        for line in &lines {
            self.write_line(line)?;
        }
        self.records_written += 1;
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        self.options.encoding.write_line(&mut self.writer, line)?;
        Ok(())
    }

    /// Number of rights written so far.
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Flushes buffered data.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes and closes the writer.
    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl RightsWriter<File> {
    /// Creates (or truncates) a file for writing.
    pub fn create(path: impl AsRef<Path>, state: DatasetState, options: CodecOptions) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(file, state, options))
    }
}

/// Encodes a right into its file lines, comments excluded.
pub fn encode_right(
    right: &OperationalRight,
    state: &DatasetState,
    options: &CodecOptions,
) -> Result<Vec<String>> {
    let blocks = match right.body() {
        RightBody::Opaque(lines) => return Ok(lines.clone()),
        RightBody::Structured(blocks) => blocks,
    };

    let descriptor = schema::lookup_understood(right.rule_type()).ok_or_else(|| {
        OprError::UnsupportedRuleType {
            id: right.id.clone(),
            rule_type: right.rule_type(),
        }
    })?;

    let precision = options.precision;
    let indent = CONTINUATION_INDENT;

    let structure_count = if descriptor.supports_intervening() {
        blocks.intervening.len()
    } else {
        if !blocks.intervening.is_empty() {
            warn!(
                "Rule type {} of right '{}' carries no intervening structures, {} not written",
                right.rule_type(),
                right.id,
                blocks.intervening.len()
            );
        }
        0
    };
    let has_switches = blocks.monthly_switches.is_some();
    let dumx = dumx::encode(has_switches, structure_count, right.rule_type());

    let mut lines = vec![encode_header(right, dumx, precision)?];

    if descriptor.uses_rio_grande() {
        lines.push(encode_rio_grande(right, &blocks.rio_grande, precision)?);
    }

    if descriptor.uses_san_juan() {
        let sj = &blocks.san_juan;
        lines.push(encode_reals(indent, &[sj.min_content, sj.release], precision));
    }

    if let Some(switches) = &blocks.monthly_switches {
        lines.push(encode_ints(indent, switches));
    }

    if descriptor.uses_associated_rule(right.limit) {
        let id = match blocks.associated_rule.as_str() {
            "" => NO_ASSOCIATED_RULE,
            id => id,
        };
        lines.push(encode_tokens(indent, &[id], ID_WIDTH));
    }

    if structure_count > 0 {
        lines.extend(encode_intervening(right, descriptor, blocks, precision)?);
    }

    if descriptor.uses_monthly_max(right.limit) {
        for value in &blocks.monthly_max {
            lines.push(encode_reals(indent, &[*value], precision));
        }
    }

    let source2 = right.source2();
    if descriptor.uses_monthly_efficiency(state, &source2.id, source2.account) {
        for value in &blocks.monthly_efficiency {
            lines.push(encode_reals(indent, &[*value], precision));
        }
    }

    Ok(lines)
}

fn encode_intervening(
    right: &OperationalRight,
    descriptor: &RuleTypeDescriptor,
    blocks: &RuleBlocks,
    precision: usize,
) -> Result<Vec<String>> {
    if descriptor.uses_intervening_with_loss(right.conveyance_loss) {
        return Ok(blocks
            .intervening
            .iter()
            .map(|s| {
                let loss = format_real(s.loss_percent, precision, usize::MAX);
                encode_tokens(CONTINUATION_INDENT, &[&s.id, &loss, &s.kind], ID_WIDTH)
            })
            .collect());
    }

    let values: Vec<FieldValue> = blocks
        .intervening
        .iter()
        .map(|s| FieldValue::Text(s.id.clone()))
        .collect();
    let layout = intervening_layout(values.len());
    Ok(vec![encode_line(&values, layout, precision)?])
}

/// Writes a complete operating-rule file.
///
/// `header` is read before `output_path` is opened, so the output may
/// replace the file the header came from.
///
/// # Errors
///
/// Any write error, including [`OprError::FieldOverflow`] and
/// [`OprError::UnsupportedRuleType`]. The output file is left incomplete
/// on error.
pub fn write_rights(
    header: &dyn HeaderSource,
    output_path: impl AsRef<Path>,
    rights: &[OperationalRight],
    extra_header_comments: &[String],
    state: &DatasetState,
    options: &CodecOptions,
) -> Result<()> {
    let output_path = output_path.as_ref();
    let header_lines = header.header_lines()?;
    info!(
        "Writing {} operating right(s) to {}",
        rights.len(),
        output_path.display()
    );

    let mut writer = RightsWriter::create(output_path, state.clone(), options.clone())?;
    writer.write_header(&header_lines, extra_header_comments)?;
    for right in rights {
        writer.write_right(right)?;
    }

    info!(
        "Wrote {} operating right(s) to {}",
        writer.records_written(),
        output_path.display()
    );
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rights::model::{InterveningStructure, StructureAccount};

    fn to_string(f: impl FnOnce(&mut RightsWriter<&mut Vec<u8>>) -> Result<()>) -> String {
        let mut buf = Vec::new();
        {
            let mut writer = RightsWriter::new(&mut buf, DatasetState::default(), CodecOptions::default());
            f(&mut writer).unwrap();
            writer.finish().unwrap();
        }
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_header_adds_version_and_marker() {
        let out = to_string(|w| w.write_header(&["# Basin rules".to_string()], &["Edited".to_string()]));
        assert_eq!(
            out,
            "# FileFormatVersion 2\n# Edited\n# Basin rules\n# EndHeader\n"
        );
    }

    #[test]
    fn test_header_kept_as_is() {
        let header = vec![
            "# FileFormatVersion 2".to_string(),
            "#-----e-----b".to_string(),
        ];
        let out = to_string(|w| w.write_header(&header, &[]));
        assert_eq!(out, "# FileFormatVersion 2\n#-----e-----b\n");
    }

    #[test]
    fn test_opaque_written_verbatim() {
        let mut right = OperationalRight::new("X", 99);
        right.comments.push(" raw".to_string());
        right.set_raw_lines(vec!["X  weird".to_string(), "   tail ".to_string()]);
        let out = to_string(|w| w.write_right(&right));
        assert_eq!(out, "# raw\nX  weird\n   tail \n");
    }

    #[test]
    fn test_structured_unknown_type_fails() {
        let mut right = OperationalRight::new("X", 11);
        right.set_rule_type(99);
        match encode_right(&right, &DatasetState::default(), &CodecOptions::default()) {
            Err(OprError::UnsupportedRuleType { rule_type, .. }) => assert_eq!(rule_type, 99),
            other => panic!("Expected UnsupportedRuleType, got {:?}", other),
        }
    }

    #[test]
    fn test_overflow_is_error() {
        let mut right = OperationalRight::new("X", 12);
        right.limit = 123_456_789.0;
        let result = encode_right(&right, &DatasetState::default(), &CodecOptions::default());
        assert!(matches!(result, Err(OprError::FieldOverflow { .. })));
    }

    #[test]
    fn test_intervening_without_loss_line() {
        let mut right = OperationalRight::new("X", 45);
        right.limit = 0.0;
        right.conveyance_loss = 0.0;
        right
            .set_intervening(vec![
                InterveningStructure::new("Ditch_A"),
                InterveningStructure::new("Ditch_B"),
            ])
            .unwrap();

        let lines = encode_right(&right, &DatasetState::default(), &CodecOptions::default()).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], format!("{}Ditch_A     Ditch_B", " ".repeat(36)));
    }

    #[test]
    fn test_intervening_with_loss_lines() {
        let mut right = OperationalRight::new("X", 45);
        right.conveyance_loss = 5.0;
        right
            .add_intervening(InterveningStructure::with_loss("Ditch_A", 2.5, "Carrier"))
            .unwrap();

        let lines = encode_right(&right, &DatasetState::default(), &CodecOptions::default()).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            format!("{}Ditch_A      2.50         Carrier", " ".repeat(36))
        );
    }

    #[test]
    fn test_efficiency_block_follows_state() {
        let mut right = OperationalRight::new("Plan", 27);
        right.sources[1] = StructureAccount::new("Plan_01", 1);

        let off = encode_right(&right, &DatasetState::default(), &CodecOptions::default()).unwrap();
        let on = encode_right(&right, &DatasetState::with_monthly_efficiency(), &CodecOptions::default()).unwrap();
        assert_eq!(off.len(), 1);
        assert_eq!(on.len(), 13);
    }

    #[test]
    fn test_structures_dropped_for_types_without_them() {
        let mut right = OperationalRight::new("X", 1);
        right.add_intervening(InterveningStructure::new("A")).unwrap();
        let lines = encode_right(&right, &DatasetState::default(), &CodecOptions::default()).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(&lines[0][52..60], "      0.");
    }
}
