//! Change tracking for edited rights.
//!
//! Edits are detected by comparing against a [`Snapshot`] taken before the
//! edit session, and reported through a [`ChangeSink`] owned by whatever
//! orchestrates the dataset. Rights hold no back-reference to their
//! dataset.
//!
//! # Examples
//!
//! ```
//! use oprights::rights::{DirtyFlag, OperationalRight, Snapshot};
//!
//! let mut right = OperationalRight::new("Carrier_01", 11);
//! let snapshot = Snapshot::take(&right);
//!
//! right.limit = 250.0;
//! assert!(snapshot.is_dirty(&right));
//!
//! let mut dirty = DirtyFlag::default();
//! let snapshot = snapshot.commit(&right, &mut dirty);
//! assert!(dirty.is_dirty());
//! assert!(!snapshot.is_dirty(&right));
//! ```

use crate::rights::model::OperationalRight;
use log::debug;
use std::sync::Arc;

/// Receives change notifications for rights.
pub trait ChangeSink {
    /// Called once per committed right that differs from its snapshot.
    fn right_changed(&mut self, id: &str);
}

/// A sink that only remembers whether anything changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyFlag {
    dirty: bool,
    changed: Vec<String>,
}

impl DirtyFlag {
    /// Whether any change was reported.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Ids reported as changed, in report order.
    pub fn changed_ids(&self) -> &[String] {
        &self.changed
    }

    /// Forgets all reported changes.
    pub fn clear(&mut self) {
        self.dirty = false;
        self.changed.clear();
    }
}

impl ChangeSink for DirtyFlag {
    fn right_changed(&mut self, id: &str) {
        self.dirty = true;
        self.changed.push(id.to_string());
    }
}

/// Immutable copy of a right taken before editing.
///
/// Cloning a snapshot shares the stored right.
#[derive(Debug, Clone)]
pub struct Snapshot {
    saved: Arc<OperationalRight>,
}

impl Snapshot {
    /// Takes a snapshot of `right`.
    pub fn take(right: &OperationalRight) -> Self {
        Snapshot {
            saved: Arc::new(right.clone()),
        }
    }

    /// The saved right.
    pub fn saved(&self) -> &OperationalRight {
        &self.saved
    }

    /// Whether `live` differs from the snapshot.
    pub fn is_dirty(&self, live: &OperationalRight) -> bool {
        *self.saved != *live
    }

    /// Puts the saved state back into `live`. Returns whether anything was
    /// undone.
    pub fn restore(&self, live: &mut OperationalRight) -> bool {
        if !self.is_dirty(live) {
            return false;
        }
        *live = (*self.saved).clone();
        true
    }

    /// Reports `live` to `sink` if it changed and returns a new baseline.
    pub fn commit(self, live: &OperationalRight, sink: &mut dyn ChangeSink) -> Snapshot {
        if !self.is_dirty(live) {
            return self;
        }
        debug!("Right '{}' changed, committing new baseline", live.id);
        sink.right_changed(&live.id);
        Snapshot::take(live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rights::model::InterveningStructure;

    #[test]
    fn test_clean_right_is_not_dirty() {
        let right = OperationalRight::new("R1", 11);
        let snapshot = Snapshot::take(&right);
        assert!(!snapshot.is_dirty(&right));

        let mut sink = DirtyFlag::default();
        let snapshot = snapshot.commit(&right, &mut sink);
        assert!(!sink.is_dirty());
        assert!(!snapshot.is_dirty(&right));
    }

    #[test]
    fn test_restore_undoes_edits() {
        let mut right = OperationalRight::new("R1", 11);
        let snapshot = Snapshot::take(&right);

        right.add_intervening(InterveningStructure::new("Ditch")).unwrap();
        right.comments.push(" edited".to_string());
        assert!(snapshot.is_dirty(&right));

        assert!(snapshot.restore(&mut right));
        assert!(right.intervening().is_empty());
        assert_eq!(right.dumx(), 0);
        assert!(!snapshot.restore(&mut right));
    }

    #[test]
    fn test_commit_reports_id() {
        let mut right = OperationalRight::new("R1", 11);
        let snapshot = Snapshot::take(&right);
        right.set_monthly_switch(0, 0);

        let mut sink = DirtyFlag::default();
        let snapshot = snapshot.commit(&right, &mut sink);
        assert_eq!(sink.changed_ids(), ["R1".to_string()]);
        assert_eq!(snapshot.saved().dumx(), 12);

        sink.clear();
        assert!(!sink.is_dirty());
    }
}
