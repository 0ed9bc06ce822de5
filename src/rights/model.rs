//! Operating-rule record model.
//!
//! An [`OperationalRight`] is one record of the operating-rule file: a
//! header (identifiers, accounts, rule type, limits) followed by a
//! [`RightBody`]. The body is either the typed optional blocks of an
//! understood rule type, or the record's lines kept verbatim.
//!
//! Plain header data lives in public fields. State that carries an
//! invariant is private and changed through mutators that return whether
//! anything changed:
//!
//! - the rule type and its cached [`RuleTypeDescriptor`] always agree
//! - `dumx` is recomputed whenever the monthly switches or the intervening
//!   structures change (see [`crate::rights::dumx`])
//! - a raw-text body is never edited field by field
//!
//! # Examples
//!
//! ```
//! use oprights::rights::{InterveningStructure, OperationalRight};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut right = OperationalRight::new("Carrier_01", 11);
//! assert_eq!(right.dumx(), 0);
//!
//! right.set_monthly_switches(Some([1; 12]));
//! assert_eq!(right.dumx(), 12);
//!
//! right.add_intervening(InterveningStructure::new("Ditch_A"))?;
//! assert_eq!(right.dumx(), -13);
//! # Ok(())
//! # }
//! ```

use crate::error::{OprError, Result};
use crate::formats::primitives::{MISSING_DOUBLE, MISSING_INT};
use crate::rights::dumx::{self, MAX_INTERVENING, MONTHS};
use crate::rights::schema::{self, RuleTypeDescriptor};

/// Entries in the monthly maximum block: twelve months and the annual total.
pub const MONTHLY_MAX_ENTRIES: usize = 13;

/// Source slots per right. Slots 3 to 5 are carried by the Rio Grande line.
pub const SOURCE_SLOTS: usize = 5;

/// Replaces `slot` with `value`, reporting whether it changed.
pub(crate) fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

/// A structure id paired with an account number.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct StructureAccount {
    /// Structure identifier
    pub id: String,
    /// Account (ownership or sub-account) number
    pub account: i32,
}

impl StructureAccount {
    /// Creates an id/account pair.
    pub fn new(id: impl Into<String>, account: i32) -> Self {
        StructureAccount {
            id: id.into(),
            account,
        }
    }
}

/// A structure the water passes through between source and destination.
#[derive(Debug, Clone, PartialEq)]
pub struct InterveningStructure {
    /// Structure identifier
    pub id: String,
    /// Conveyance loss percent ([`MISSING_DOUBLE`] when not given)
    pub loss_percent: f64,
    /// Structure kind, e.g. `Carrier` or `Return` (empty when not given)
    pub kind: String,
}

impl InterveningStructure {
    /// A structure without loss data.
    pub fn new(id: impl Into<String>) -> Self {
        InterveningStructure {
            id: id.into(),
            loss_percent: MISSING_DOUBLE,
            kind: String::new(),
        }
    }

    /// A structure with loss percent and kind.
    pub fn with_loss(id: impl Into<String>, loss_percent: f64, kind: impl Into<String>) -> Self {
        InterveningStructure {
            id: id.into(),
            loss_percent,
            kind: kind.into(),
        }
    }
}

/// Values of the Rio Grande compact line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RioGrandeValues {
    /// Initial compact debt
    pub initial_debt: f64,
    /// Maximum compact debt
    pub max_debt: f64,
}

impl Default for RioGrandeValues {
    fn default() -> Self {
        RioGrandeValues {
            initial_debt: MISSING_DOUBLE,
            max_debt: MISSING_DOUBLE,
        }
    }
}

/// Values of the San Juan recovery line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SanJuanValues {
    /// Minimum reservoir content
    pub min_content: f64,
    /// Release amount
    pub release: f64,
}

impl Default for SanJuanValues {
    fn default() -> Self {
        SanJuanValues {
            min_content: MISSING_DOUBLE,
            release: MISSING_DOUBLE,
        }
    }
}

/// Optional data blocks of a structured record.
///
/// Which of these are written is decided by the rule type descriptor and
/// the header values, not by what is filled in here.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleBlocks {
    pub(crate) monthly_switches: Option<[i32; MONTHS]>,
    pub(crate) intervening: Vec<InterveningStructure>,
    pub(crate) associated_rule: String,
    pub(crate) monthly_max: [f64; MONTHLY_MAX_ENTRIES],
    pub(crate) monthly_efficiency: [f64; MONTHS],
    pub(crate) rio_grande: RioGrandeValues,
    pub(crate) san_juan: SanJuanValues,
}

impl Default for RuleBlocks {
    fn default() -> Self {
        RuleBlocks {
            monthly_switches: None,
            intervening: Vec::new(),
            associated_rule: String::new(),
            monthly_max: [MISSING_DOUBLE; MONTHLY_MAX_ENTRIES],
            monthly_efficiency: [MISSING_DOUBLE; MONTHS],
            rio_grande: RioGrandeValues::default(),
            san_juan: SanJuanValues::default(),
        }
    }
}

/// Body of a record: typed blocks, or the record's lines verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum RightBody {
    /// Typed optional blocks of an understood rule type
    Structured(RuleBlocks),
    /// Raw lines (header included) of a record that is re-emitted as is
    Opaque(Vec<String>),
}

/// One operating rule.
#[derive(Debug, Clone)]
pub struct OperationalRight {
    /// Rule identifier
    pub id: String,
    /// Rule name
    pub name: String,
    /// Administration number, kept as text so priorities compare exactly
    pub admin_number: String,
    /// On/off switch (also used for a start or stop year)
    pub on_off: i32,
    /// Destination structure and account
    pub destination: StructureAccount,
    /// Source structures and accounts
    pub sources: [StructureAccount; SOURCE_SLOTS],
    /// Reuse plan identifier
    pub reuse_plan: String,
    /// Diversion type
    pub diversion_type: String,
    /// Conveyance loss percent
    pub conveyance_loss: f64,
    /// Operational limit
    pub limit: f64,
    /// First year the rule operates
    pub begin_year: i32,
    /// Last year the rule operates
    pub end_year: i32,
    /// Comment lines (without `#`) found before the record
    pub comments: Vec<String>,
    dumx: i32,
    rule_type: i32,
    descriptor: Option<&'static RuleTypeDescriptor>,
    body: RightBody,
}

impl OperationalRight {
    /// Creates an empty right of the given rule type.
    ///
    /// Understood rule types get an empty structured body. Any other type
    /// gets an empty raw-text body.
    pub fn new(id: impl Into<String>, rule_type: i32) -> Self {
        let descriptor = schema::lookup(rule_type);
        let body = match descriptor {
            Some(d) if d.fully_understood => RightBody::Structured(RuleBlocks::default()),
            _ => RightBody::Opaque(Vec::new()),
        };

        OperationalRight {
            id: id.into(),
            name: String::new(),
            admin_number: String::new(),
            on_off: 1,
            destination: StructureAccount::default(),
            sources: Default::default(),
            reuse_plan: String::new(),
            diversion_type: String::new(),
            conveyance_loss: 0.0,
            limit: 0.0,
            begin_year: 0,
            end_year: 0,
            comments: Vec::new(),
            dumx: 0,
            rule_type,
            descriptor,
            body,
        }
    }

    /// Rule type number.
    pub fn rule_type(&self) -> i32 {
        self.rule_type
    }

    /// Descriptor of the rule type, if the type is known.
    pub fn descriptor(&self) -> Option<&'static RuleTypeDescriptor> {
        self.descriptor
    }

    /// Changes the rule type and refreshes the cached descriptor.
    ///
    /// The body is left alone: a structured right switched to a type with
    /// no layout fails to encode until switched back.
    pub fn set_rule_type(&mut self, rule_type: i32) -> bool {
        if self.rule_type == rule_type {
            return false;
        }
        self.rule_type = rule_type;
        self.descriptor = schema::lookup(rule_type);
        self.recompute_dumx();
        true
    }

    /// The packed switch/structure count column.
    pub fn dumx(&self) -> i32 {
        self.dumx
    }

    /// First source.
    pub fn source1(&self) -> &StructureAccount {
        &self.sources[0]
    }

    /// Second source.
    pub fn source2(&self) -> &StructureAccount {
        &self.sources[1]
    }

    /// The record body.
    pub fn body(&self) -> &RightBody {
        &self.body
    }

    /// Whether the record is carried as raw text.
    pub fn is_opaque(&self) -> bool {
        matches!(self.body, RightBody::Opaque(_))
    }

    /// Whether the rule type's layout is implemented.
    pub fn is_understood(&self) -> bool {
        self.descriptor.is_some_and(|d| d.fully_understood)
    }

    /// Raw lines of an opaque record; empty for structured records.
    pub fn raw_lines(&self) -> &[String] {
        match &self.body {
            RightBody::Opaque(lines) => lines,
            RightBody::Structured(_) => &[],
        }
    }

    /// Typed blocks of a structured record.
    pub fn blocks(&self) -> Option<&RuleBlocks> {
        match &self.body {
            RightBody::Structured(blocks) => Some(blocks),
            RightBody::Opaque(_) => None,
        }
    }

    fn blocks_mut(&mut self) -> Option<&mut RuleBlocks> {
        match &mut self.body {
            RightBody::Structured(blocks) => Some(blocks),
            RightBody::Opaque(_) => None,
        }
    }

    /// Monthly on/off switches, if present.
    pub fn monthly_switches(&self) -> Option<&[i32; MONTHS]> {
        self.blocks().and_then(|b| b.monthly_switches.as_ref())
    }

    /// Replaces the monthly switches and recomputes dumx.
    pub fn set_monthly_switches(&mut self, switches: Option<[i32; MONTHS]>) -> bool {
        let changed = match self.blocks_mut() {
            Some(blocks) => replace(&mut blocks.monthly_switches, switches),
            None => false,
        };
        if changed {
            self.recompute_dumx();
        }
        changed
    }

    /// Sets one month's switch (`month` is 0-based).
    ///
    /// Creates the switch line, all months on, if the right had none.
    /// Returns false for an out-of-range month or a raw-text record.
    pub fn set_monthly_switch(&mut self, month: usize, value: i32) -> bool {
        if month >= MONTHS {
            return false;
        }
        let mut switches = self.monthly_switches().copied().unwrap_or([1; MONTHS]);
        switches[month] = value;
        self.set_monthly_switches(Some(switches))
    }

    /// Intervening structures.
    pub fn intervening(&self) -> &[InterveningStructure] {
        self.blocks().map_or(&[], |b| b.intervening.as_slice())
    }

    /// Appends an intervening structure and recomputes dumx.
    ///
    /// # Errors
    ///
    /// [`OprError::TooManyStructures`] if the right already holds the
    /// maximum.
    pub fn add_intervening(&mut self, structure: InterveningStructure) -> Result<bool> {
        let count = self.intervening().len() + 1;
        if count > MAX_INTERVENING {
            return Err(self.too_many(count));
        }
        let changed = match self.blocks_mut() {
            Some(blocks) => {
                blocks.intervening.push(structure);
                true
            }
            None => false,
        };
        if changed {
            self.recompute_dumx();
        }
        Ok(changed)
    }

    /// Replaces all intervening structures and recomputes dumx.
    ///
    /// # Errors
    ///
    /// [`OprError::TooManyStructures`] for more than the maximum.
    pub fn set_intervening(&mut self, structures: Vec<InterveningStructure>) -> Result<bool> {
        if structures.len() > MAX_INTERVENING {
            return Err(self.too_many(structures.len()));
        }
        let changed = match self.blocks_mut() {
            Some(blocks) => replace(&mut blocks.intervening, structures),
            None => false,
        };
        if changed {
            self.recompute_dumx();
        }
        Ok(changed)
    }

    /// Removes the intervening structure at `index` and recomputes dumx.
    pub fn remove_intervening(&mut self, index: usize) -> Option<InterveningStructure> {
        let removed = self
            .blocks_mut()
            .filter(|b| index < b.intervening.len())
            .map(|b| b.intervening.remove(index));
        if removed.is_some() {
            self.recompute_dumx();
        }
        removed
    }

    /// Associated operating rule identifier (empty when not set).
    pub fn associated_rule(&self) -> &str {
        self.blocks().map_or("", |b| b.associated_rule.as_str())
    }

    /// Sets the associated operating rule identifier.
    pub fn set_associated_rule(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        self.blocks_mut()
            .is_some_and(|b| replace(&mut b.associated_rule, id))
    }

    /// Monthly maximum limits (twelve months, then the annual total).
    pub fn monthly_max(&self) -> Option<&[f64; MONTHLY_MAX_ENTRIES]> {
        self.blocks().map(|b| &b.monthly_max)
    }

    /// Sets one monthly maximum entry (index 12 is the annual total).
    pub fn set_monthly_max(&mut self, index: usize, value: f64) -> bool {
        self.blocks_mut()
            .filter(|_| index < MONTHLY_MAX_ENTRIES)
            .is_some_and(|b| replace(&mut b.monthly_max[index], value))
    }

    /// Monthly efficiencies.
    pub fn monthly_efficiency(&self) -> Option<&[f64; MONTHS]> {
        self.blocks().map(|b| &b.monthly_efficiency)
    }

    /// Sets one monthly efficiency (`month` is 0-based).
    pub fn set_monthly_efficiency(&mut self, month: usize, value: f64) -> bool {
        self.blocks_mut()
            .filter(|_| month < MONTHS)
            .is_some_and(|b| replace(&mut b.monthly_efficiency[month], value))
    }

    /// Rio Grande compact values.
    pub fn rio_grande(&self) -> Option<&RioGrandeValues> {
        self.blocks().map(|b| &b.rio_grande)
    }

    /// Sets the Rio Grande compact values.
    pub fn set_rio_grande(&mut self, values: RioGrandeValues) -> bool {
        self.blocks_mut()
            .is_some_and(|b| replace(&mut b.rio_grande, values))
    }

    /// San Juan recovery values.
    pub fn san_juan(&self) -> Option<&SanJuanValues> {
        self.blocks().map(|b| &b.san_juan)
    }

    /// Sets the San Juan recovery values.
    pub fn set_san_juan(&mut self, values: SanJuanValues) -> bool {
        self.blocks_mut()
            .is_some_and(|b| replace(&mut b.san_juan, values))
    }

    /// Recomputes dumx from the switches and intervening structures.
    ///
    /// Raw-text records keep the value read from their header.
    pub fn recompute_dumx(&mut self) -> bool {
        let Some(blocks) = self.blocks() else {
            return false;
        };
        let value = dumx::encode(
            blocks.monthly_switches.is_some(),
            blocks.intervening.len(),
            self.rule_type,
        );
        replace(&mut self.dumx, value)
    }

    /// Stores the dumx literal read from a header line.
    pub(crate) fn set_decoded_dumx(&mut self, dumx: i32) {
        self.dumx = dumx;
    }

    /// Installs a decoded structured body.
    pub(crate) fn set_blocks(&mut self, blocks: RuleBlocks) {
        self.body = RightBody::Structured(blocks);
        self.recompute_dumx();
    }

    /// Turns the record into raw text holding `lines`.
    pub(crate) fn set_raw_lines(&mut self, lines: Vec<String>) {
        self.body = RightBody::Opaque(lines);
    }

    fn too_many(&self, count: usize) -> OprError {
        OprError::TooManyStructures {
            id: self.id.clone(),
            count,
            max: MAX_INTERVENING,
        }
    }
}

impl Default for OperationalRight {
    fn default() -> Self {
        OperationalRight::new(String::new(), MISSING_INT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_understood_is_structured() {
        let right = OperationalRight::new("R1", 11);
        assert!(!right.is_opaque());
        assert!(right.is_understood());
        assert_eq!(right.rule_type(), 11);
        assert_eq!(right.descriptor().map(|d| d.rule_type), Some(11));
        assert!(right.raw_lines().is_empty());
    }

    #[test]
    fn test_new_unknown_is_opaque() {
        let right = OperationalRight::new("R1", 99);
        assert!(right.is_opaque());
        assert!(!right.is_understood());
        assert!(right.descriptor().is_none());

        let right = OperationalRight::new("R2", 13);
        assert!(right.is_opaque());
        assert!(right.descriptor().is_some());
    }

    #[test]
    fn test_switches_drive_dumx() {
        let mut right = OperationalRight::new("R1", 12);
        assert!(right.set_monthly_switches(Some([1; 12])));
        assert_eq!(right.dumx(), 12);

        // Same value again is not a change
        assert!(!right.set_monthly_switches(Some([1; 12])));

        assert!(right.set_monthly_switch(3, 0));
        assert_eq!(right.monthly_switches().unwrap()[3], 0);
        assert!(!right.set_monthly_switch(12, 0));

        assert!(right.set_monthly_switches(None));
        assert_eq!(right.dumx(), 0);
    }

    #[test]
    fn test_intervening_drive_dumx() {
        let mut right = OperationalRight::new("R1", 11);
        right.add_intervening(InterveningStructure::new("A")).unwrap();
        right.add_intervening(InterveningStructure::new("B")).unwrap();
        assert_eq!(right.dumx(), 2);

        right.set_monthly_switches(Some([1; 12]));
        assert_eq!(right.dumx(), -14);

        let removed = right.remove_intervening(0).unwrap();
        assert_eq!(removed.id, "A");
        assert_eq!(right.dumx(), -13);
        assert!(right.remove_intervening(5).is_none());
    }

    #[test]
    fn test_too_many_intervening() {
        let mut right = OperationalRight::new("R1", 11);
        let structures: Vec<_> = (0..MAX_INTERVENING)
            .map(|i| InterveningStructure::new(format!("S{}", i)))
            .collect();
        assert!(right.set_intervening(structures).unwrap());
        assert_eq!(right.dumx(), 10);

        match right.add_intervening(InterveningStructure::new("extra")) {
            Err(OprError::TooManyStructures { count, max, .. }) => {
                assert_eq!(count, 11);
                assert_eq!(max, 10);
            }
            other => panic!("Expected TooManyStructures, got {:?}", other),
        }
    }

    #[test]
    fn test_rio_grande_dumx() {
        let mut right = OperationalRight::new("RG", 17);
        right.set_monthly_switches(Some([1; 12]));
        assert_eq!(right.dumx(), -20);

        assert!(right.set_rule_type(16));
        assert_eq!(right.dumx(), 12);
        assert!(!right.set_rule_type(16));
    }

    #[test]
    fn test_opaque_rejects_block_edits() {
        let mut right = OperationalRight::new("R1", 99);
        assert!(!right.set_monthly_switches(Some([1; 12])));
        assert!(!right.add_intervening(InterveningStructure::new("A")).unwrap());
        assert!(!right.set_associated_rule("Other"));
        assert!(!right.set_monthly_max(0, 1.0));
        assert!(right.monthly_max().is_none());
    }

    #[test]
    fn test_block_setters_report_changes() {
        let mut right = OperationalRight::new("R1", 47);
        assert!(right.set_monthly_max(12, 500.0));
        assert!(!right.set_monthly_max(12, 500.0));
        assert!(!right.set_monthly_max(13, 1.0));
        assert_eq!(right.monthly_max().unwrap()[12], 500.0);

        assert!(right.set_monthly_efficiency(0, 60.0));
        assert!(right.set_associated_rule("Limit_01"));
        assert_eq!(right.associated_rule(), "Limit_01");

        let rg = RioGrandeValues { initial_debt: 1.0, max_debt: 2.0 };
        assert!(right.set_rio_grande(rg));
        assert_eq!(right.rio_grande(), Some(&rg));

        let sj = SanJuanValues { min_content: 3.0, release: 4.0 };
        assert!(right.set_san_juan(sj));
        assert!(!right.set_san_juan(sj));
    }

    #[test]
    fn test_raw_lines() {
        let mut right = OperationalRight::new("R1", 99);
        right.set_raw_lines(vec!["R1 header".to_string(), "   body".to_string()]);
        assert_eq!(right.raw_lines().len(), 2);
        assert!(right.blocks().is_none());
    }
}
