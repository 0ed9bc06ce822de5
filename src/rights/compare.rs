//! Total ordering of operating rules.
//!
//! Used for change detection and for sorting. Floating-point fields are
//! compared with [`f64::total_cmp`], so every pair of rights has a
//! definite answer, NaN included. `Eq` and `Ord` on [`OperationalRight`]
//! are defined through [`compare`].
//!
//! Raw-text records carry no typed fields worth trusting, so a comparison
//! involving one falls back to the raw lines. Every structured record
//! sorts before every raw-text record.

use crate::rights::model::{
    InterveningStructure, OperationalRight, RioGrandeValues, RuleBlocks, SanJuanValues,
};
use std::cmp::Ordering;

/// Compares two rights.
///
/// Order of comparison: identifiers and text, numeric header fields, the
/// optional blocks (variable-length lists by length first), then comments.
pub fn compare(a: &OperationalRight, b: &OperationalRight) -> Ordering {
    let body = match (a.blocks(), b.blocks()) {
        (Some(ba), Some(bb)) => compare_header(a, b).then_with(|| compare_blocks(ba, bb)),
        _ => cmp_slices(a.raw_lines(), b.raw_lines(), Ord::cmp)
            .then_with(|| a.is_opaque().cmp(&b.is_opaque())),
    };
    body.then_with(|| cmp_slices(&a.comments, &b.comments, Ord::cmp))
}

fn compare_header(a: &OperationalRight, b: &OperationalRight) -> Ordering {
    a.id.cmp(&b.id)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.admin_number.cmp(&b.admin_number))
        .then_with(|| a.destination.cmp(&b.destination))
        .then_with(|| a.sources.cmp(&b.sources))
        .then_with(|| a.reuse_plan.cmp(&b.reuse_plan))
        .then_with(|| a.diversion_type.cmp(&b.diversion_type))
        .then_with(|| a.rule_type().cmp(&b.rule_type()))
        .then_with(|| a.dumx().cmp(&b.dumx()))
        .then_with(|| a.on_off.cmp(&b.on_off))
        .then_with(|| a.conveyance_loss.total_cmp(&b.conveyance_loss))
        .then_with(|| a.limit.total_cmp(&b.limit))
        .then_with(|| a.begin_year.cmp(&b.begin_year))
        .then_with(|| a.end_year.cmp(&b.end_year))
}

fn compare_blocks(a: &RuleBlocks, b: &RuleBlocks) -> Ordering {
    a.associated_rule
        .cmp(&b.associated_rule)
        .then_with(|| compare_rio_grande(&a.rio_grande, &b.rio_grande))
        .then_with(|| compare_san_juan(&a.san_juan, &b.san_juan))
        .then_with(|| a.monthly_switches.cmp(&b.monthly_switches))
        .then_with(|| cmp_slices(&a.intervening, &b.intervening, compare_intervening))
        .then_with(|| cmp_slices(&a.monthly_max, &b.monthly_max, f64::total_cmp))
        .then_with(|| cmp_slices(&a.monthly_efficiency, &b.monthly_efficiency, f64::total_cmp))
}

fn compare_intervening(a: &InterveningStructure, b: &InterveningStructure) -> Ordering {
    a.id.cmp(&b.id)
        .then_with(|| a.kind.cmp(&b.kind))
        .then_with(|| a.loss_percent.total_cmp(&b.loss_percent))
}

fn compare_rio_grande(a: &RioGrandeValues, b: &RioGrandeValues) -> Ordering {
    a.initial_debt
        .total_cmp(&b.initial_debt)
        .then_with(|| a.max_debt.total_cmp(&b.max_debt))
}

fn compare_san_juan(a: &SanJuanValues, b: &SanJuanValues) -> Ordering {
    a.min_content
        .total_cmp(&b.min_content)
        .then_with(|| a.release.total_cmp(&b.release))
}

// Length first, then element by element.
fn cmp_slices<T>(a: &[T], b: &[T], mut cmp: impl FnMut(&T, &T) -> Ordering) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| {
        a.iter()
            .zip(b)
            .map(|(x, y)| cmp(x, y))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    })
}

impl PartialEq for OperationalRight {
    fn eq(&self, other: &Self) -> bool {
        compare(self, other).is_eq()
    }
}

impl Eq for OperationalRight {}

impl PartialOrd for OperationalRight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OperationalRight {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self, other)
    }
}
