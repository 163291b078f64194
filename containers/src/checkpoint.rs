use crate::{Bytes32, Slot};
use serde::{Deserialize, Serialize};
use ssz_derive::Ssz;

/// Names a specific block used as a justification or finalization anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Ssz, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub root: Bytes32,
    pub slot: Slot,
}

impl Checkpoint {
    pub fn new(root: Bytes32, slot: Slot) -> Self {
        Self { root, slot }
    }

    /// The zero checkpoint: root and slot both zero.
    pub fn zero() -> Self {
        Self {
            root: Bytes32::zero(),
            slot: Slot(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_checkpoint_has_zero_root_and_slot() {
        let checkpoint = Checkpoint::zero();
        assert_eq!(checkpoint.root, Bytes32::zero());
        assert_eq!(checkpoint.slot, Slot(0));
    }

    #[test]
    fn checkpoints_with_equal_fields_are_equal() {
        let a = Checkpoint::zero();
        let b = Checkpoint {
            root: Bytes32::zero(),
            slot: Slot(0),
        };
        assert_eq!(a, b);
    }
}
