//! Column layouts of the operating-rule record lines.
//!
//! The header line and the fixed-width block lines are declared here as
//! [`ColumnSpec`] tables; the reader and writer share them so the two can
//! never disagree on a column.

use crate::error::Result;
use crate::formats::primitives::{
    decode_line, encode_line, ColumnSpec, FieldValue, MISSING_DOUBLE, MISSING_INT,
};
use crate::rights::dumx::MAX_INTERVENING;
use crate::rights::model::{OperationalRight, RioGrandeValues, StructureAccount};

/// Indentation of every line after the header.
pub const CONTINUATION_INDENT: usize = 36;

/// Width of an identifier column.
pub const ID_WIDTH: usize = 12;

/// Text written for an empty associated-rule id.
pub const NO_ASSOCIATED_RULE: &str = "NA";

/// Header line of every record.
pub const HEADER_LAYOUT: &[ColumnSpec] = &[
    ColumnSpec::text("id", ID_WIDTH),
    ColumnSpec::text("name", 24),
    ColumnSpec::text_right("administration number", 16),
    ColumnSpec::decimal_integer("dumx", 8),
    ColumnSpec::integer("on/off", 8),
    ColumnSpec::skip(1),
    ColumnSpec::text("destination", ID_WIDTH),
    ColumnSpec::integer("destination account", 8),
    ColumnSpec::skip(1),
    ColumnSpec::text("source 1", ID_WIDTH),
    ColumnSpec::integer("source 1 account", 8),
    ColumnSpec::skip(1),
    ColumnSpec::text("source 2", ID_WIDTH),
    ColumnSpec::integer("source 2 account", 8),
    ColumnSpec::integer("rule type", 8),
    ColumnSpec::skip(1),
    ColumnSpec::text("reuse plan", ID_WIDTH),
    ColumnSpec::skip(1),
    ColumnSpec::text("diversion type", ID_WIDTH),
    ColumnSpec::skip(1),
    ColumnSpec::real("conveyance loss", 8),
    ColumnSpec::real("limit", 8),
    ColumnSpec::integer("begin year", 8),
    ColumnSpec::integer("end year", 8),
];

/// Rio Grande compact line: two debts, then sources 3 to 5.
pub const RIO_GRANDE_LAYOUT: &[ColumnSpec] = &[
    ColumnSpec::skip(CONTINUATION_INDENT),
    ColumnSpec::real("initial debt", 8),
    ColumnSpec::real("maximum debt", 8),
    ColumnSpec::skip(1),
    ColumnSpec::text("source 3", ID_WIDTH),
    ColumnSpec::integer("source 3 account", 8),
    ColumnSpec::skip(1),
    ColumnSpec::text("source 4", ID_WIDTH),
    ColumnSpec::integer("source 4 account", 8),
    ColumnSpec::skip(1),
    ColumnSpec::text("source 5", ID_WIDTH),
    ColumnSpec::integer("source 5 account", 8),
];

const INTERVENING_ID: ColumnSpec = ColumnSpec::text("intervening structure", ID_WIDTH);

const INTERVENING_IDS: [ColumnSpec; MAX_INTERVENING + 1] = [
    ColumnSpec::skip(CONTINUATION_INDENT),
    INTERVENING_ID,
    INTERVENING_ID,
    INTERVENING_ID,
    INTERVENING_ID,
    INTERVENING_ID,
    INTERVENING_ID,
    INTERVENING_ID,
    INTERVENING_ID,
    INTERVENING_ID,
    INTERVENING_ID,
];

/// Layout of the intervening id line holding `count` ids.
///
/// `count` is clamped to [`MAX_INTERVENING`].
pub fn intervening_layout(count: usize) -> &'static [ColumnSpec] {
    &INTERVENING_IDS[..=count.min(MAX_INTERVENING)]
}

/// Decodes a header line into a right with an empty body.
pub(crate) fn decode_header(line: &str, line_number: usize) -> Result<OperationalRight> {
    let mut values = decode_line(line, HEADER_LAYOUT, line_number)?.into_iter();

    let id = next_text(&mut values);
    let name = next_text(&mut values);
    let admin_number = next_text(&mut values);
    let dumx = next_int(&mut values);
    let on_off = next_int(&mut values);
    let destination = next_account(&mut values);
    let source1 = next_account(&mut values);
    let source2 = next_account(&mut values);
    let rule_type = next_int(&mut values);

    let mut right = OperationalRight::new(id, rule_type);
    right.name = name;
    right.admin_number = admin_number;
    right.on_off = on_off;
    right.destination = destination;
    right.sources[0] = source1;
    right.sources[1] = source2;
    right.reuse_plan = next_text(&mut values);
    right.diversion_type = next_text(&mut values);
    right.conveyance_loss = next_real(&mut values);
    right.limit = next_real(&mut values);
    right.begin_year = next_int(&mut values);
    right.end_year = next_int(&mut values);
    right.set_decoded_dumx(dumx);
    Ok(right)
}

fn next_text(values: &mut impl Iterator<Item = FieldValue>) -> String {
    values.next().map(FieldValue::into_text).unwrap_or_default()
}

fn next_int(values: &mut impl Iterator<Item = FieldValue>) -> i32 {
    values.next().and_then(|v| v.as_int()).unwrap_or(MISSING_INT)
}

fn next_real(values: &mut impl Iterator<Item = FieldValue>) -> f64 {
    values.next().and_then(|v| v.as_real()).unwrap_or(MISSING_DOUBLE)
}

fn next_account(values: &mut impl Iterator<Item = FieldValue>) -> StructureAccount {
    let id = next_text(values);
    StructureAccount::new(id, next_int(values))
}

/// Encodes the header line with the given dumx value.
pub(crate) fn encode_header(right: &OperationalRight, dumx: i32, precision: usize) -> Result<String> {
    let values = [
        FieldValue::Text(right.id.clone()),
        FieldValue::Text(right.name.clone()),
        FieldValue::Text(right.admin_number.clone()),
        FieldValue::Integer(dumx),
        FieldValue::Integer(right.on_off),
        FieldValue::Text(right.destination.id.clone()),
        FieldValue::Integer(right.destination.account),
        FieldValue::Text(right.sources[0].id.clone()),
        FieldValue::Integer(right.sources[0].account),
        FieldValue::Text(right.sources[1].id.clone()),
        FieldValue::Integer(right.sources[1].account),
        FieldValue::Integer(right.rule_type()),
        FieldValue::Text(right.reuse_plan.clone()),
        FieldValue::Text(right.diversion_type.clone()),
        FieldValue::Real(right.conveyance_loss),
        FieldValue::Real(right.limit),
        FieldValue::Integer(right.begin_year),
        FieldValue::Integer(right.end_year),
    ];
    encode_line(&values, HEADER_LAYOUT, precision)
}

/// Decodes the Rio Grande line into its values and sources 3 to 5.
pub(crate) fn decode_rio_grande(
    line: &str,
    line_number: usize,
) -> Result<(RioGrandeValues, [StructureAccount; 3])> {
    let mut values = decode_line(line, RIO_GRANDE_LAYOUT, line_number)?.into_iter();
    let rio_grande = RioGrandeValues {
        initial_debt: next_real(&mut values),
        max_debt: next_real(&mut values),
    };
    let mut sources: [StructureAccount; 3] = Default::default();
    for source in sources.iter_mut() {
        *source = next_account(&mut values);
    }
    Ok((rio_grande, sources))
}

/// Encodes the Rio Grande line.
pub(crate) fn encode_rio_grande(
    right: &OperationalRight,
    values: &RioGrandeValues,
    precision: usize,
) -> Result<String> {
    let mut fields = vec![
        FieldValue::Real(values.initial_debt),
        FieldValue::Real(values.max_debt),
    ];
    for source in &right.sources[2..] {
        fields.push(FieldValue::Text(source.id.clone()));
        fields.push(FieldValue::Integer(source.account));
    }
    encode_line(&fields, RIO_GRANDE_LAYOUT, precision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::primitives::fixed_width::layout_width;

    #[test]
    fn test_header_width() {
        assert_eq!(layout_width(HEADER_LAYOUT), 198);
        assert_eq!(layout_width(RIO_GRANDE_LAYOUT), 115);
    }

    #[test]
    fn test_intervening_layout() {
        assert_eq!(intervening_layout(0).len(), 1);
        assert_eq!(layout_width(intervening_layout(3)), 36 + 36);
        assert_eq!(intervening_layout(25).len(), MAX_INTERVENING + 1);
    }

    #[test]
    fn test_header_round_trip() {
        let mut right = OperationalRight::new("Carrier_01", 11);
        right.name = "Ditch carrier".to_string();
        right.admin_number = "45678.00000".to_string();
        right.destination = StructureAccount::new("Dest_01", 1);
        right.sources[0] = StructureAccount::new("Src_01", 2);
        right.sources[1] = StructureAccount::new("Src_02", 0);
        right.reuse_plan = "NA".to_string();
        right.diversion_type = "Diversion".to_string();
        right.conveyance_loss = 2.5;
        right.limit = 100.0;
        right.begin_year = 1950;
        right.end_year = 9999;

        let line = encode_header(&right, -13, 2).unwrap();
        assert!(line.starts_with("Carrier_01  Ditch carrier"));

        let decoded = decode_header(&line, 1).unwrap();
        assert_eq!(decoded.id, right.id);
        assert_eq!(decoded.name, right.name);
        assert_eq!(decoded.admin_number, right.admin_number);
        assert_eq!(decoded.dumx(), -13);
        assert_eq!(decoded.destination, right.destination);
        assert_eq!(decoded.sources[..2], right.sources[..2]);
        assert_eq!(decoded.rule_type(), 11);
        assert_eq!(decoded.reuse_plan, "NA");
        assert_eq!(decoded.diversion_type, "Diversion");
        assert_eq!(decoded.conveyance_loss, 2.5);
        assert_eq!(decoded.limit, 100.0);
        assert_eq!(decoded.begin_year, 1950);
        assert_eq!(decoded.end_year, 9999);
    }

    #[test]
    fn test_header_dumx_has_forced_decimal() {
        let right = OperationalRight::new("R", 12);
        let line = encode_header(&right, 12, 2).unwrap();
        assert_eq!(&line[52..60], "     12.");
    }

    #[test]
    fn test_short_header_uses_sentinels() {
        let right = decode_header("Short_01    A short record", 4).unwrap();
        assert_eq!(right.id, "Short_01");
        assert_eq!(right.name, "A short record");
        assert_eq!(right.conveyance_loss, MISSING_DOUBLE);
        assert!(right.descriptor().is_none());
    }

    #[test]
    fn test_rio_grande_round_trip() {
        let mut right = OperationalRight::new("RG", 17);
        right.sources[2] = StructureAccount::new("Gage_A", 1);
        right.sources[4] = StructureAccount::new("Gage_C", 3);
        let values = RioGrandeValues { initial_debt: 10.5, max_debt: 200.0 };

        let line = encode_rio_grande(&right, &values, 2).unwrap();
        assert!(line.starts_with(&" ".repeat(CONTINUATION_INDENT)));

        let (decoded, sources) = decode_rio_grande(&line, 2).unwrap();
        assert_eq!(decoded, values);
        assert_eq!(sources[0], right.sources[2]);
        assert_eq!(sources[1].id, "");
        assert_eq!(sources[2], right.sources[4]);
    }
}
