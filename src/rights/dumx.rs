//! The packed `dumx` header column.
//!
//! One signed integer tells the reader whether a monthly switch line
//! follows and how many intervening structures to expect:
//!
//! | dumx            | switches | structures      |
//! |-----------------|----------|-----------------|
//! | `12`            | 12       | 0               |
//! | `>= 0`          | 0        | `dumx`          |
//! | `< -12`         | 12       | `-(dumx + 12)`  |
//! | `-12 ..= -1`    | 0        | `-dumx`         |
//!
//! The Rio Grande compact types override this: switches are present only
//! for `-20` and structures never are. A blank column (the missing-value
//! sentinel) announces nothing.
//!
//! The value is derived data. Records recompute it from their arrays
//! whenever those change; the literal column value is only read during
//! decode.

use crate::formats::primitives::MISSING_INT;
use crate::rights::schema::is_rio_grande_special;

/// Months in a monthly switch or efficiency block.
pub const MONTHS: usize = 12;

/// Maximum intervening structures per right.
pub const MAX_INTERVENING: usize = 10;

/// dumx value that turns on monthly switches for the Rio Grande types.
pub const RIO_GRANDE_SWITCH_DUMX: i32 = -20;

/// What a dumx value announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockCounts {
    /// Number of monthly switches (0 or 12)
    pub switch_count: usize,
    /// Number of intervening structures
    pub structure_count: usize,
}

impl BlockCounts {
    /// Creates a count pair.
    pub fn new(switch_count: usize, structure_count: usize) -> Self {
        BlockCounts {
            switch_count,
            structure_count,
        }
    }
}

/// Decodes a dumx value for a rule type.
///
/// # Examples
///
/// ```
/// use oprights::rights::dumx::{decode, BlockCounts};
///
/// assert_eq!(decode(12, 12), BlockCounts::new(12, 0));
/// assert_eq!(decode(-15, 11), BlockCounts::new(12, 3));
/// assert_eq!(decode(-20, 17), BlockCounts::new(12, 0));
/// assert_eq!(decode(3, 17), BlockCounts::new(0, 0));
/// ```
pub fn decode(dumx: i32, rule_type: i32) -> BlockCounts {
    if dumx == MISSING_INT {
        return BlockCounts::default();
    }

    if is_rio_grande_special(rule_type) {
        let switch_count = if dumx == RIO_GRANDE_SWITCH_DUMX { MONTHS } else { 0 };
        return BlockCounts::new(switch_count, 0);
    }

    let magnitude = dumx.unsigned_abs() as usize;
    match dumx {
        12 => BlockCounts::new(MONTHS, 0),
        d if d >= 0 => BlockCounts::new(0, magnitude),
        d if d < -12 => BlockCounts::new(MONTHS, magnitude - 12),
        _ => BlockCounts::new(0, magnitude),
    }
}

/// Encodes switch presence and structure count as a dumx value.
///
/// Structure counts are expected to stay within [`MAX_INTERVENING`]; the
/// Rio Grande types ignore `structure_count`.
///
/// # Examples
///
/// ```
/// use oprights::rights::dumx::encode;
///
/// assert_eq!(encode(true, 0, 12), 12);
/// assert_eq!(encode(false, 4, 11), 4);
/// assert_eq!(encode(true, 3, 11), -15);
/// assert_eq!(encode(true, 0, 18), -20);
/// ```
pub fn encode(has_switches: bool, structure_count: usize, rule_type: i32) -> i32 {
    if is_rio_grande_special(rule_type) {
        return if has_switches { RIO_GRANDE_SWITCH_DUMX } else { 0 };
    }

    let count = structure_count as i32;
    match (has_switches, structure_count) {
        (true, 0) => MONTHS as i32,
        (true, _) => -(count + 12),
        (false, _) => count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_branches() {
        assert_eq!(decode(12, 1), BlockCounts::new(12, 0));
        assert_eq!(decode(0, 1), BlockCounts::new(0, 0));
        assert_eq!(decode(5, 1), BlockCounts::new(0, 5));
        assert_eq!(decode(-13, 1), BlockCounts::new(12, 1));
        assert_eq!(decode(-22, 1), BlockCounts::new(12, 10));
        assert_eq!(decode(-12, 1), BlockCounts::new(0, 12));
        assert_eq!(decode(-4, 1), BlockCounts::new(0, 4));
    }

    #[test]
    fn test_decode_missing_is_empty() {
        assert_eq!(decode(MISSING_INT, 1), BlockCounts::new(0, 0));
        assert_eq!(decode(MISSING_INT, 45), BlockCounts::new(0, 0));
        assert_eq!(decode(MISSING_INT, 17), BlockCounts::new(0, 0));
    }

    #[test]
    fn test_decode_rio_grande() {
        assert_eq!(decode(-20, 17), BlockCounts::new(12, 0));
        assert_eq!(decode(12, 17), BlockCounts::new(0, 0));
        assert_eq!(decode(-15, 18), BlockCounts::new(0, 0));
        assert_eq!(decode(0, 18), BlockCounts::new(0, 0));
    }

    #[test]
    fn test_round_trip_all_reachable_pairs() {
        for rule_type in [1, 11, 45] {
            for has_switches in [false, true] {
                for structures in 0..=MAX_INTERVENING {
                    let dumx = encode(has_switches, structures, rule_type);
                    let counts = decode(dumx, rule_type);
                    assert_eq!(counts.switch_count > 0, has_switches, "dumx {}", dumx);
                    assert_eq!(counts.structure_count, structures, "dumx {}", dumx);
                }
            }
        }
    }

    #[test]
    fn test_round_trip_rio_grande() {
        for rule_type in [17, 18] {
            assert_eq!(decode(encode(true, 0, rule_type), rule_type), BlockCounts::new(12, 0));
            assert_eq!(decode(encode(false, 0, rule_type), rule_type), BlockCounts::new(0, 0));
        }
    }
}
