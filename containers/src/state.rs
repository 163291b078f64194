use crate::block::{hash_tree_root, Attestations, Block, BlockBody, BlockHeader};
use crate::checkpoint::Checkpoint;
use crate::config::Config;
use crate::error::TransitionError;
use crate::justifiable::is_justifiable_slot;
use crate::slot::Slot;
use crate::types::{
    Bytes32, HistoricalBlockHashes, JustificationRoots, JustificationsValidators, JustifiedSlots,
    ValidatorIndex, Validators,
};
use crate::validator::Validator;
use ssz_derive::Ssz;
use std::collections::BTreeMap;

/// The single object the state transition function threads through: slot and
/// header tracking, fork-choice checkpoints, and the flattened histories
/// described in `crate` module docs.
#[derive(Clone, Debug, PartialEq, Eq, Ssz, Default)]
pub struct State {
    pub config: Config,
    pub slot: Slot,
    pub latest_block_header: BlockHeader,
    pub latest_justified: Checkpoint,
    pub latest_finalized: Checkpoint,
    pub historical_block_hashes: HistoricalBlockHashes,
    pub justified_slots: JustifiedSlots,
    pub validators: Validators,
    pub justifications_roots: JustificationRoots,
    pub justifications_validators: JustificationsValidators,
}

impl State {
    pub fn num_validators(&self) -> u64 {
        self.validators.len_u64()
    }

    /// Builds the genesis state: slot 0, empty histories, both checkpoints at
    /// the zero root, and the supplied validator set.
    pub fn generate_genesis_state(config: Config, genesis_validators: Vec<Validator>) -> Self {
        let body_root = hash_tree_root(&BlockBody::default());
        let latest_block_header = BlockHeader {
            slot: Slot(0),
            proposer_index: ValidatorIndex(0),
            parent_root: Bytes32::zero(),
            state_root: Bytes32::zero(),
            body_root,
        };

        let mut validators = Validators::default();
        for validator in genesis_validators {
            validators
                .push(validator)
                .expect("genesis validator set exceeds VALIDATOR_REGISTRY_LIMIT");
        }

        Self {
            config,
            slot: Slot(0),
            latest_block_header,
            latest_justified: Checkpoint::zero(),
            latest_finalized: Checkpoint::zero(),
            historical_block_hashes: HistoricalBlockHashes::default(),
            justified_slots: JustifiedSlots::default(),
            validators,
            justifications_roots: JustificationRoots::default(),
            justifications_validators: JustificationsValidators::default(),
        }
    }

    /// The block whose header equals `state.latest_block_header` and whose
    /// body is empty; its `state_root` is `hash(state)`.
    pub fn genesis_block(&self) -> Block {
        Block {
            slot: self.latest_block_header.slot,
            proposer_index: self.latest_block_header.proposer_index,
            parent_root: self.latest_block_header.parent_root,
            state_root: hash_tree_root(self),
            body: BlockBody::default(),
        }
    }

    /// `state_transition(block, parent_state, check_state_root)`: §4.3.1.
    pub fn state_transition(
        &self,
        block: &Block,
        check_state_root: bool,
    ) -> Result<Self, TransitionError> {
        let state = self.process_slots(block.slot)?;
        let state = state.process_block(block)?;
        if check_state_root {
            let computed = hash_tree_root(&state);
            if computed != block.state_root {
                return Err(TransitionError::StateRootMismatch);
            }
        }
        Ok(state)
    }

    /// §4.3.2: advance `state.slot` up to (but not including) `target_slot`,
    /// caching the pre-advance state's root into the header whenever it is
    /// still the zero hash.
    pub fn process_slots(&self, target_slot: Slot) -> Result<Self, TransitionError> {
        if self.slot >= target_slot {
            return Err(TransitionError::InvalidSlot {
                state_slot: self.slot.0,
                block_slot: target_slot.0,
            });
        }

        let mut state = self.clone();
        while state.slot < target_slot {
            if state.latest_block_header.state_root.is_zero() {
                let cached_root = hash_tree_root(&state);
                state.latest_block_header.state_root = cached_root;
            }
            state.slot = Slot(state.slot.0 + 1);
        }
        Ok(state)
    }

    /// §4.3.3: header validation, history extension, and attestation
    /// processing for a block already known to belong to `state.slot`.
    pub fn process_block(&self, block: &Block) -> Result<Self, TransitionError> {
        let mut state = self.clone();

        if block.slot != state.slot {
            return Err(TransitionError::InvalidSlot {
                state_slot: state.slot.0,
                block_slot: block.slot.0,
            });
        }
        if block.slot.0 <= state.latest_block_header.slot.0 {
            return Err(TransitionError::InvalidSlot {
                state_slot: state.latest_block_header.slot.0,
                block_slot: block.slot.0,
            });
        }
        let num_validators = state.num_validators();
        let expected_proposer = block.slot.0 % num_validators;
        if block.proposer_index.0 != expected_proposer {
            return Err(TransitionError::InvalidProposer {
                expected: expected_proposer,
                got: block.proposer_index.0,
            });
        }
        let parent_root = hash_tree_root(&state.latest_block_header);
        if block.parent_root != parent_root {
            return Err(TransitionError::ParentRootMismatch);
        }

        // Genesis-parent special case (§4.3.3 step 2): the only block whose
        // parent is the genesis header justifies and finalizes its own parent.
        let is_genesis_parent = state.latest_block_header.slot.0 == 0;
        if is_genesis_parent {
            state.latest_justified.root = parent_root;
            state.latest_finalized.root = parent_root;
        }

        // History extension (§4.3.3 step 3): absolute indexing — index i in
        // `historical_block_hashes`/`justified_slots` is always slot i
        // relative to genesis, never relative to the finalized slot.
        let empty_slots = block.slot.0 - state.latest_block_header.slot.0 - 1;
        state
            .historical_block_hashes
            .push(parent_root)
            .expect("historical_block_hashes exceeds HISTORICAL_ROOTS_LIMIT");
        for _ in 0..empty_slots {
            state
                .historical_block_hashes
                .push(Bytes32::zero())
                .expect("historical_block_hashes exceeds HISTORICAL_ROOTS_LIMIT");
        }

        let mut justified_bits: Vec<bool> = (0..state.justified_slots.len())
            .map(|i| state.justified_slots.get(i).copied().unwrap_or(false))
            .collect();
        justified_bits.push(is_genesis_parent);
        for _ in 0..empty_slots {
            justified_bits.push(false);
        }
        state.justified_slots = bools_to_justified_slots(&justified_bits);

        // Latest header (§4.3.3 step 4), with state_root zeroed until the
        // next `process_slots` call caches it.
        state.latest_block_header = BlockHeader {
            slot: block.slot,
            proposer_index: block.proposer_index,
            parent_root: block.parent_root,
            state_root: Bytes32::zero(),
            body_root: hash_tree_root(&block.body),
        };

        // Operations (§4.3.3 step 5).
        state.process_attestations(&block.body.attestations)
    }

    /// §4.3.4: reconstruct the logical justifications map, apply every
    /// attestation's justification/finalization effect using the *live*
    /// `latest_finalized` slot (it can change mid-loop within the same
    /// block), then reflatten deterministically.
    fn process_attestations(&self, attestations: &Attestations) -> Result<Self, TransitionError> {
        let mut state = self.clone();
        let num_validators = state.num_validators();
        let num_historical = state.historical_block_hashes.len_u64();
        let mut justifications = state.justifications_map();

        for i in 0..attestations.len_u64() {
            let signed_vote = attestations
                .get(i)
                .expect("attestation index within block body bounds");
            let vote = signed_vote.data;

            if vote.source.slot.0 >= num_historical {
                return Err(TransitionError::InvalidSourceSlot(vote.source.slot.0));
            }
            if vote.target.slot.0 >= num_historical {
                return Err(TransitionError::InvalidTargetSlot(vote.target.slot.0));
            }

            let source_justified = state
                .justified_slots
                .get(vote.source.slot.0 as usize)
                .copied()
                .unwrap_or(false);
            let target_already_justified = state
                .justified_slots
                .get(vote.target.slot.0 as usize)
                .copied()
                .unwrap_or(false);
            let source_root_matches = state
                .historical_block_hashes
                .get(vote.source.slot.0)
                .ok()
                .copied()
                == Some(vote.source.root);
            let target_root_matches = state
                .historical_block_hashes
                .get(vote.target.slot.0)
                .ok()
                .copied()
                == Some(vote.target.root);

            let skip = !source_justified
                || target_already_justified
                || !source_root_matches
                || !target_root_matches
                || vote.target.slot.0 <= vote.source.slot.0
                || !is_justifiable_slot(state.latest_finalized.slot.0, vote.target.slot.0);

            if skip {
                continue;
            }

            if vote.validator_id.0 >= num_validators {
                return Err(TransitionError::InvalidVoter(vote.validator_id.0));
            }

            let bitvector = justifications
                .entry(vote.target.root)
                .or_insert_with(|| vec![false; num_validators as usize]);
            bitvector[vote.validator_id.0 as usize] = true;

            let count = bitvector.iter().filter(|&&bit| bit).count() as u64;
            if 3 * count >= 2 * num_validators {
                state.latest_justified = vote.target;
                state.justified_slots.set(vote.target.slot.0 as usize, true);
                justifications.remove(&vote.target.root);

                let finalizes = !((vote.source.slot.0 + 1)..vote.target.slot.0)
                    .any(|slot| is_justifiable_slot(state.latest_finalized.slot.0, slot));
                if finalizes {
                    state.latest_finalized = vote.source;
                }
            }
        }

        let (roots, bits) = flatten_justifications(&justifications);
        state.justifications_roots = roots;
        state.justifications_validators = bits;

        Ok(state)
    }

    /// Reconstructs the logical `root -> bitvector` map from the flattened
    /// `(justifications_roots, justifications_validators)` pair.
    fn justifications_map(&self) -> BTreeMap<Bytes32, Vec<bool>> {
        let num_validators = self.num_validators() as usize;
        let mut map = BTreeMap::new();
        for i in 0..self.justifications_roots.len_u64() {
            let root = *self
                .justifications_roots
                .get(i)
                .expect("justifications_roots index within bounds");
            let mut bits = Vec::with_capacity(num_validators);
            for v in 0..num_validators {
                let flat_index = i as usize * num_validators + v;
                let bit = self
                    .justifications_validators
                    .get(flat_index)
                    .copied()
                    .unwrap_or(false);
                bits.push(bit);
            }
            map.insert(root, bits);
        }
        map
    }
}

fn bools_to_justified_slots(bits: &[bool]) -> JustifiedSlots {
    let mut list = JustifiedSlots::new(false, bits.len());
    for (i, &bit) in bits.iter().enumerate() {
        if bit {
            list.set(i, true);
        }
    }
    list
}

fn flatten_justifications(
    map: &BTreeMap<Bytes32, Vec<bool>>,
) -> (JustificationRoots, JustificationsValidators) {
    let mut roots = JustificationRoots::default();
    let mut flat_bits = Vec::new();
    for (root, bits) in map {
        roots
            .push(*root)
            .expect("justifications_roots exceeds HISTORICAL_ROOTS_LIMIT");
        flat_bits.extend_from_slice(bits);
    }

    let mut validators_bits = JustificationsValidators::new(false, flat_bits.len());
    for (i, &bit) in flat_bits.iter().enumerate() {
        if bit {
            validators_bits.set(i, true);
        }
    }

    (roots, validators_bits)
}
