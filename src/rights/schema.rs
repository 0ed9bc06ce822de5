//! Rule-type schema registry.
//!
//! Every operating rule names a rule type. The type decides which optional
//! blocks follow the header line, so the codec looks the descriptor up once
//! per record and then only reads flags. The table is a `static` built at
//! compile time and never changes.
//!
//! Types whose layout is not implemented are still listed (so they keep a
//! name) but have `fully_understood == false`; records of those types, and
//! of types missing from the table, are carried as raw text.
//!
//! # Examples
//!
//! ```
//! use oprights::rights::schema;
//!
//! let carrier = schema::lookup(11).unwrap();
//! assert!(carrier.fully_understood);
//! assert!(carrier.uses_monthly_switch());
//!
//! assert!(schema::lookup(99).is_none());
//! ```

use crate::config::DatasetState;
use crate::formats::primitives::fields::is_blank_id;
use serde::Serialize;

/// Rule types whose dumx column follows the Rio Grande convention.
pub const RIO_GRANDE_SPECIAL_TYPES: [i32; 2] = [17, 18];

/// Capabilities of one rule type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuleTypeDescriptor {
    /// Rule type number
    pub rule_type: i32,
    /// Human-readable name
    pub name: &'static str,
    /// Whether the record layout is implemented
    pub fully_understood: bool,
    monthly_switch: bool,
    intervening_without_loss: bool,
    intervening_with_loss: bool,
    associated_rule: bool,
    rio_grande: bool,
    san_juan: bool,
    monthly_max: bool,
    monthly_efficiency: bool,
}

impl RuleTypeDescriptor {
    const fn understood(rule_type: i32, name: &'static str) -> Self {
        RuleTypeDescriptor {
            rule_type,
            name,
            fully_understood: true,
            monthly_switch: true,
            intervening_without_loss: false,
            intervening_with_loss: false,
            associated_rule: false,
            rio_grande: false,
            san_juan: false,
            monthly_max: false,
            monthly_efficiency: false,
        }
    }

    const fn opaque(rule_type: i32, name: &'static str) -> Self {
        RuleTypeDescriptor {
            fully_understood: false,
            monthly_switch: false,
            ..Self::understood(rule_type, name)
        }
    }

    const fn intervening(self) -> Self {
        RuleTypeDescriptor { intervening_without_loss: true, ..self }
    }

    const fn lossy_intervening(self) -> Self {
        RuleTypeDescriptor {
            intervening_without_loss: true,
            intervening_with_loss: true,
            ..self
        }
    }

    const fn associated(self) -> Self {
        RuleTypeDescriptor { associated_rule: true, ..self }
    }

    const fn rio_grande(self) -> Self {
        RuleTypeDescriptor { rio_grande: true, ..self }
    }

    const fn san_juan(self) -> Self {
        RuleTypeDescriptor { san_juan: true, ..self }
    }

    const fn monthly_limits(self) -> Self {
        RuleTypeDescriptor { monthly_max: true, ..self }
    }

    const fn efficiency(self) -> Self {
        RuleTypeDescriptor { monthly_efficiency: true, ..self }
    }

    /// Whether a monthly on/off switch line may follow the header.
    pub fn uses_monthly_switch(&self) -> bool {
        self.monthly_switch
    }

    /// Whether the intervening structures are written with loss data.
    ///
    /// Only when the type supports it and the conveyance loss is positive.
    pub fn uses_intervening_with_loss(&self, conveyance_loss: f64) -> bool {
        self.intervening_with_loss && conveyance_loss > 0.0
    }

    /// Whether the intervening structures are written as a plain id line.
    ///
    /// A type that supports both forms uses this one whenever the with-loss
    /// form is not in effect.
    pub fn uses_intervening_without_loss(&self, conveyance_loss: f64) -> bool {
        self.intervening_without_loss && !self.uses_intervening_with_loss(conveyance_loss)
    }

    /// Whether the type can carry intervening structures in any form.
    pub fn supports_intervening(&self) -> bool {
        self.intervening_without_loss || self.intervening_with_loss
    }

    /// Whether an associated operating rule line follows.
    pub fn uses_associated_rule(&self, limit: f64) -> bool {
        self.associated_rule && limit > 0.0
    }

    /// Whether the Rio Grande line follows the header.
    pub fn uses_rio_grande(&self) -> bool {
        self.rio_grande
    }

    /// Whether the San Juan line follows the header.
    pub fn uses_san_juan(&self) -> bool {
        self.san_juan
    }

    /// Whether the 13-line monthly/annual maximum block follows.
    pub fn uses_monthly_max(&self, limit: f64) -> bool {
        self.monthly_max && limit > 0.0
    }

    /// Whether the 12-line monthly efficiency block follows.
    ///
    /// Requires the dataset to enable efficiencies and the secondary source
    /// to name a real structure account.
    pub fn uses_monthly_efficiency(
        &self,
        state: &DatasetState,
        source2_id: &str,
        source2_account: i32,
    ) -> bool {
        self.monthly_efficiency
            && state.monthly_efficiency
            && !is_blank_id(source2_id)
            && source2_account > 0
    }

    /// Whether the dumx column follows the Rio Grande convention.
    pub fn is_rio_grande_special(&self) -> bool {
        is_rio_grande_special(self.rule_type)
    }
}

/// Whether the rule type follows the Rio Grande dumx convention.
pub fn is_rio_grande_special(rule_type: i32) -> bool {
    RIO_GRANDE_SPECIAL_TYPES.contains(&rule_type)
}

type D = RuleTypeDescriptor;

// Indexed by rule type - 1.
static RULE_TYPES: [RuleTypeDescriptor; 50] = [
    D::understood(1, "Reservoir Release to an Instream Flow"),
    D::understood(2, "Reservoir Release to a Direct Flow or Reservoir").intervening(),
    D::understood(3, "Reservoir Release to a Direct Flow or Reservoir by a Carrier").intervening(),
    D::understood(4, "Reservoir Release to a Direct Flow User by Exchange").intervening(),
    D::understood(5, "Reservoir Storage by Exchange").intervening(),
    D::understood(6, "Reservoir to Reservoir Transfer (Bookover)").intervening(),
    D::understood(7, "Reservoir Release to a Carrier by Exchange").intervening(),
    D::understood(8, "Out-of-Priority Reservoir Storage"),
    D::understood(9, "Reservoir Release for Target Contents"),
    D::understood(10, "General Replacement Reservoir Release").intervening(),
    D::understood(11, "Direct Flow or Reservoir by a Carrier").intervening(),
    D::understood(12, "Reservoir Release Reoperation"),
    D::opaque(13, "Index Flow Constraint on an Instream Flow"),
    D::understood(14, "Direct Flow by a Carrier with Constrained Demand").intervening(),
    D::understood(15, "Interruptible Supply"),
    D::understood(16, "Direct Flow Storage"),
    D::understood(17, "Rio Grande Compact - Rio Grande").rio_grande(),
    D::understood(18, "Rio Grande Compact - Conejos").rio_grande(),
    D::opaque(19, "Split Channel Operation"),
    D::understood(20, "San Juan Reservoir RIP Operation").san_juan(),
    D::opaque(21, "Sprinkler Use"),
    D::opaque(22, "Soil Moisture Use"),
    D::understood(23, "Downstream Call"),
    D::understood(24, "Direct Flow Exchange").lossy_intervening(),
    D::understood(25, "Direct Flow Bypass").lossy_intervening(),
    D::understood(26, "Changed Water Right"),
    D::understood(27, "Plan Release Direct").lossy_intervening().associated().efficiency(),
    D::understood(28, "Plan Release by Exchange").lossy_intervening().associated().efficiency(),
    D::understood(29, "Plan Spill"),
    D::understood(30, "Reservoir Re-Store"),
    D::understood(31, "Carrier to a Ditch or Reservoir with Reuse").lossy_intervening(),
    D::understood(32, "Reservoir and Plan Direct").lossy_intervening().efficiency(),
    D::understood(33, "Reservoir and Plan by Exchange").lossy_intervening().efficiency(),
    D::understood(34, "Reservoir to Reservoir Bookover with Reuse").lossy_intervening(),
    D::understood(35, "Import to a Ditch or Reservoir").lossy_intervening(),
    D::opaque(36, "Seasonal Water Right"),
    D::opaque(37, "Augmentation Well"),
    D::opaque(38, "Out-of-Priority Diversion"),
    D::opaque(39, "Alternate Point"),
    D::opaque(40, "South Platte Compact"),
    D::understood(41, "Out-of-Priority Storage by Exchange"),
    D::opaque(42, "Plan Demand Reset"),
    D::opaque(43, "In-Priority Supply"),
    D::opaque(44, "Recharge Well"),
    D::understood(45, "Carrier with Transit Loss").lossy_intervening().associated(),
    D::understood(46, "Multiple Ownership").associated(),
    D::understood(47, "Administration Plan Limits").monthly_limits(),
    D::understood(48, "Plan or Reuse to a Reservoir Direct").lossy_intervening().associated(),
    D::understood(49, "Plan or Reuse to a Reservoir by Exchange").lossy_intervening().associated(),
    D::opaque(50, "South Platte Compact Storage"),
];

/// Looks up a rule type.
///
/// Returns `None` for numbers outside the table; callers treat that the same
/// as a descriptor with `fully_understood == false`.
pub fn lookup(rule_type: i32) -> Option<&'static RuleTypeDescriptor> {
    let index = usize::try_from(rule_type).ok()?.checked_sub(1)?;
    RULE_TYPES.get(index)
}

/// Looks up a rule type and keeps it only when its layout is implemented.
pub fn lookup_understood(rule_type: i32) -> Option<&'static RuleTypeDescriptor> {
    lookup(rule_type).filter(|d| d.fully_understood)
}

/// All descriptors, in rule type order.
pub fn all() -> impl Iterator<Item = &'static RuleTypeDescriptor> {
    RULE_TYPES.iter()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_indexed_by_rule_type() {
        for (i, descriptor) in all().enumerate() {
            assert_eq!(descriptor.rule_type, i as i32 + 1);
        }
    }

    #[test]
    fn test_lookup_out_of_range() {
        assert!(lookup(0).is_none());
        assert!(lookup(-3).is_none());
        assert!(lookup(51).is_none());
        assert!(lookup(99).is_none());
    }

    #[test]
    fn test_opaque_types() {
        let d = lookup(13).unwrap();
        assert!(!d.fully_understood);
        assert!(lookup_understood(13).is_none());
        assert!(lookup_understood(12).is_some());
    }

    #[test]
    fn test_rio_grande() {
        for rule_type in RIO_GRANDE_SPECIAL_TYPES {
            let d = lookup(rule_type).unwrap();
            assert!(d.uses_rio_grande());
            assert!(d.is_rio_grande_special());
        }
        assert!(!lookup(16).unwrap().is_rio_grande_special());
    }

    #[test]
    fn test_intervening_depends_on_loss() {
        let d = lookup(45).unwrap();
        assert!(d.uses_intervening_with_loss(5.0));
        assert!(!d.uses_intervening_without_loss(5.0));

        assert!(!d.uses_intervening_with_loss(0.0));
        assert!(d.uses_intervening_without_loss(0.0));

        // Missing loss is not a loss
        assert!(!d.uses_intervening_with_loss(-999.0));
    }

    #[test]
    fn test_without_loss_only_type() {
        let d = lookup(11).unwrap();
        assert!(d.uses_intervening_without_loss(10.0));
        assert!(!d.uses_intervening_with_loss(10.0));
        assert!(d.supports_intervening());
        assert!(!lookup(12).unwrap().supports_intervening());
    }

    #[test]
    fn test_limit_conditions() {
        let d = lookup(47).unwrap();
        assert!(d.uses_monthly_max(1.0));
        assert!(!d.uses_monthly_max(0.0));

        let d = lookup(46).unwrap();
        assert!(d.uses_associated_rule(2.0));
        assert!(!d.uses_associated_rule(0.0));
        assert!(!d.uses_monthly_max(2.0));
    }

    #[test]
    fn test_monthly_efficiency_conditions() {
        let d = lookup(27).unwrap();
        let on = DatasetState::with_monthly_efficiency();
        let off = DatasetState::default();

        assert!(d.uses_monthly_efficiency(&on, "Plan_01", 1));
        assert!(!d.uses_monthly_efficiency(&off, "Plan_01", 1));
        assert!(!d.uses_monthly_efficiency(&on, "", 1));
        assert!(!d.uses_monthly_efficiency(&on, "NA", 1));
        assert!(!d.uses_monthly_efficiency(&on, "Plan_01", 0));
        assert!(!lookup(11).unwrap().uses_monthly_efficiency(&on, "Plan_01", 1));
    }

    #[test]
    fn test_san_juan() {
        assert!(lookup(20).unwrap().uses_san_juan());
        assert!(!lookup(19).unwrap().uses_san_juan());
    }
}
