use serde::{Deserialize, Serialize};
use ssz_derive::Ssz;
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Ssz, Default, Serialize, Deserialize)]
pub struct Slot(pub u64);

impl PartialOrd for Slot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Slot {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl Slot {
    /// Whether this slot may still receive a justifying vote given `finalized`.
    /// See `crate::justifiable::is_justifiable_slot` for the predicate itself.
    ///
    /// # Panics
    ///
    /// Panics if `self` precedes `finalized`.
    pub fn is_justifiable_after(self, finalized: Slot) -> bool {
        crate::justifiable::is_justifiable_slot(finalized.0, self.0)
    }
}
