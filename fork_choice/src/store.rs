//! The fork-choice store (component C6): block/state bookkeeping, vote
//! accounting, and the tick-driven lifecycle described in the module docs.

use crate::error::ForkChoiceError;
use crate::head::get_fork_choice_head;
use containers::{
    hash_tree_root, AcceptAllVerifier, Block, Bytes32, Checkpoint, Config, SignatureVerifier,
    SignedVote, Slot, State, Vote, ValidatorIndex,
};
use std::collections::HashMap;

pub type Interval = u64;

/// Wall-clock intervals per slot, and seconds per slot/interval. Chosen to
/// match a 4-second slot split into four one-second intervals.
pub const INTERVALS_PER_SLOT: Interval = 4;
pub const SECONDS_PER_SLOT: u64 = 4;
pub const SECONDS_PER_INTERVAL: u64 = SECONDS_PER_SLOT / INTERVALS_PER_SLOT;
/// How many slots back `get_vote_target` is willing to walk while looking
/// for a target no later than the safe target.
const JUSTIFICATION_LOOKBACK_SLOTS: u64 = 3;

#[derive(Debug, Clone)]
pub struct Store<V: SignatureVerifier = AcceptAllVerifier> {
    pub time: Interval,
    pub config: Config,
    pub head: Bytes32,
    pub safe_target: Bytes32,
    pub latest_justified: Checkpoint,
    pub latest_finalized: Checkpoint,
    pub blocks: HashMap<Bytes32, Block>,
    pub states: HashMap<Bytes32, State>,
    /// Votes already observed in a block.
    pub latest_known_votes: HashMap<ValidatorIndex, Checkpoint>,
    /// Votes heard off-chain, not yet merged.
    pub latest_new_votes: HashMap<ValidatorIndex, Checkpoint>,
    pub verifier: V,
    /// The anchor's own root. `update_head` substitutes this for any
    /// winning `latest_justified`/`latest_finalized` checkpoint whose slot
    /// is 0, since a genesis state's own checkpoints carry the zero root,
    /// which names no block in `blocks`.
    genesis_root: Bytes32,
}

/// §5/§6: initialize a store from an anchor (state, block) pair. A genesis
/// anchor carries zero-root checkpoints (there is nothing earlier to point
/// at), which `get_fork_choice_head` cannot walk from since that root would
/// never be a key in `blocks`; a zero-root checkpoint is therefore
/// normalized to point at the anchor block itself. A non-genesis anchor
/// (e.g. weak-subjectivity sync) keeps its own checkpoints verbatim.
pub fn get_forkchoice_store(anchor_state: State, anchor_block: Block, config: Config) -> Store {
    get_forkchoice_store_with_verifier(anchor_state, anchor_block, config, AcceptAllVerifier)
}

pub fn get_forkchoice_store_with_verifier<V: SignatureVerifier>(
    anchor_state: State,
    anchor_block: Block,
    config: Config,
    verifier: V,
) -> Store<V> {
    let block_root = hash_tree_root(&anchor_block);
    let anchor_checkpoint = Checkpoint::new(block_root, anchor_block.slot);

    let latest_justified = if anchor_state.latest_justified.root.is_zero() {
        anchor_checkpoint
    } else {
        anchor_state.latest_justified
    };
    let latest_finalized = if anchor_state.latest_finalized.root.is_zero() {
        anchor_checkpoint
    } else {
        anchor_state.latest_finalized
    };

    Store {
        time: anchor_block.slot.0 * INTERVALS_PER_SLOT,
        config,
        head: block_root,
        safe_target: block_root,
        latest_justified,
        latest_finalized,
        blocks: [(block_root, anchor_block)].into(),
        states: [(block_root, anchor_state)].into(),
        latest_known_votes: HashMap::new(),
        latest_new_votes: HashMap::new(),
        verifier,
        genesis_root: block_root,
    }
}

impl<V: SignatureVerifier> Store<V> {
    pub fn current_slot(&self) -> Slot {
        Slot(self.time / INTERVALS_PER_SLOT)
    }

    /// §6 `on_tick`: advance `time` to the number of intervals elapsed since
    /// genesis, never backwards.
    pub fn on_tick(&mut self, wall_clock_seconds: u64) {
        let elapsed_intervals = wall_clock_seconds
            .saturating_sub(self.config.genesis_time)
            .saturating_mul(INTERVALS_PER_SLOT)
            / SECONDS_PER_SLOT;
        if self.time < elapsed_intervals {
            self.time = elapsed_intervals;
        }
    }

    /// §4.5.2 `validate_attestation`: both checkpoints must name known
    /// blocks at the slot they claim, in source-before-target order, and the
    /// target may not be further in the future than the store has ticked to.
    fn validate_attestation(&self, vote: &Vote) -> Result<(), ForkChoiceError> {
        let source_block = self
            .blocks
            .get(&vote.source.root)
            .ok_or(ForkChoiceError::InvalidAttestation)?;
        let target_block = self
            .blocks
            .get(&vote.target.root)
            .ok_or(ForkChoiceError::InvalidAttestation)?;

        let valid = source_block.slot <= target_block.slot
            && vote.source.slot <= vote.target.slot
            && vote.source.slot == source_block.slot
            && vote.target.slot == target_block.slot
            && vote.target.slot.0 <= self.current_slot().0 + 1;

        if valid {
            Ok(())
        } else {
            Err(ForkChoiceError::InvalidAttestation)
        }
    }

    /// §4.5.2 `process_attestation`: structurally validate, then record the
    /// vote's `target` checkpoint as this validator's latest, keyed by
    /// whether it arrived embedded in a block or over gossip.
    pub fn on_attestation(
        &mut self,
        signed_vote: SignedVote,
        is_from_block: bool,
    ) -> Result<(), ForkChoiceError> {
        if !self.verifier.verify(&signed_vote) {
            return Err(ForkChoiceError::InvalidSignature);
        }

        let vote = signed_vote.data;
        self.validate_attestation(&vote)?;

        let validator_index = ValidatorIndex(vote.validator_id.0);

        if is_from_block {
            let is_newer = self
                .latest_known_votes
                .get(&validator_index)
                .map_or(true, |existing| existing.slot < vote.target.slot);
            if is_newer {
                self.latest_known_votes.insert(validator_index, vote.target);
            }

            if let Some(pending) = self.latest_new_votes.get(&validator_index) {
                if pending.slot <= vote.target.slot {
                    self.latest_new_votes.remove(&validator_index);
                }
            }
        } else {
            if vote.slot.0 > self.current_slot().0 + 1 {
                return Err(ForkChoiceError::InvalidAttestation);
            }

            let is_newer = self
                .latest_new_votes
                .get(&validator_index)
                .map_or(true, |existing| existing.slot < vote.target.slot);
            if is_newer {
                self.latest_new_votes.insert(validator_index, vote.target);
            }
        }
        Ok(())
    }

    /// §6 `on_block`: run the state transition, record every attestation the
    /// block carries as a known vote, then recompute the head.
    pub fn on_block(&mut self, block: Block) -> Result<(), ForkChoiceError> {
        let block_root = hash_tree_root(&block);
        if self.blocks.contains_key(&block_root) {
            return Ok(());
        }

        let parent_state = self
            .states
            .get(&block.parent_root)
            .ok_or(ForkChoiceError::UnknownParent(block.parent_root))?;
        let post_state = parent_state.state_transition(&block, true)?;

        let attestations = block.body.attestations.clone();
        self.blocks.insert(block_root, block);
        self.states.insert(block_root, post_state);

        for i in 0..attestations.len_u64() {
            let signed_vote = attestations
                .get(i)
                .expect("attestation index within block body bounds");
            self.on_attestation(*signed_vote, true)?;
        }

        self.update_head();
        Ok(())
    }

    /// §6 `update_head`: recompute the store's justified checkpoint from
    /// whatever state currently has the highest one, then run LMD-GHOST from
    /// it over every known vote.
    pub fn update_head(&mut self) {
        if let Some(mut latest_justified) = self.latest_justified_from_states() {
            if latest_justified.slot.0 == 0 {
                latest_justified.root = self.genesis_root;
            }
            self.latest_justified = latest_justified;
        }
        self.head = get_fork_choice_head(
            &self.blocks,
            self.latest_justified.root,
            &self.latest_known_votes,
            0,
        );
        if let Some(state) = self.states.get(&self.head) {
            let mut latest_finalized = state.latest_finalized;
            if latest_finalized.slot.0 == 0 {
                latest_finalized.root = self.genesis_root;
            }
            self.latest_finalized = latest_finalized;
        }
    }

    fn latest_justified_from_states(&self) -> Option<Checkpoint> {
        self.states
            .values()
            .map(|state| state.latest_justified)
            .max_by_key(|checkpoint| (checkpoint.slot, checkpoint.root))
    }

    /// §6 `update_safe_target`: like `update_head`, but restricted to votes
    /// not yet promoted to "known" and requiring a two-thirds supermajority.
    pub fn update_safe_target(&mut self) {
        let num_validators = self
            .states
            .get(&self.head)
            .map_or(0, |state| state.num_validators() as usize);
        let min_score = (num_validators * 2 + 2) / 3;
        self.safe_target = get_fork_choice_head(
            &self.blocks,
            self.latest_justified.root,
            &self.latest_new_votes,
            min_score,
        );
    }

    /// §6 `accept_new_votes`: promote every pending vote to known, then
    /// recompute the head.
    pub fn accept_new_votes(&mut self) {
        let new_votes: Vec<_> = self.latest_new_votes.drain().collect();
        self.latest_known_votes.extend(new_votes);
        self.update_head();
    }

    /// §6 `tick_interval`: the per-interval scheduler. On interval 0 of a
    /// slot with a known proposal, or on the slot's last interval
    /// regardless, pending votes become known; interval 2 recomputes the
    /// safe target.
    pub fn tick_interval(&mut self, has_proposal: bool) {
        self.time += 1;
        let interval = self.time % INTERVALS_PER_SLOT;

        match interval {
            0 if has_proposal => self.accept_new_votes(),
            2 => self.update_safe_target(),
            i if i == INTERVALS_PER_SLOT - 1 => self.accept_new_votes(),
            _ => {}
        }
    }

    /// §6 `get_proposal_head`: fast-forward the clock to `slot`'s wall time,
    /// flush pending votes, and return the resulting head.
    pub fn get_proposal_head(&mut self, slot: Slot) -> Bytes32 {
        let slot_time = self.config.genesis_time + slot.0 * SECONDS_PER_SLOT;
        self.on_tick(slot_time);
        self.accept_new_votes();
        self.head
    }

    /// §6 `get_vote_target`: walk back from the head toward the safe target
    /// (bounded lookback), then further back until the result is justifiable
    /// given the latest finalized slot.
    pub fn get_vote_target(&self) -> Checkpoint {
        let mut target_root = self.head;

        for _ in 0..JUSTIFICATION_LOOKBACK_SLOTS {
            let target_slot = self.blocks[&target_root].slot;
            let safe_slot = self.blocks[&self.safe_target].slot;
            if target_slot > safe_slot {
                target_root = self.blocks[&target_root].parent_root;
            } else {
                break;
            }
        }

        while !self.blocks[&target_root]
            .slot
            .is_justifiable_after(self.latest_finalized.slot)
        {
            target_root = self.blocks[&target_root].parent_root;
        }

        let target_block = &self.blocks[&target_root];
        Checkpoint::new(target_root, target_block.slot)
    }

    /// §4.5.5 `produce_block`: advance to `slot`, then iteratively grow the
    /// attestation set to a fixed point — each round re-derives every known
    /// voter's candidate attestation against the trial post-state (which
    /// fixes `source` to whatever the trial state's `latest_justified` is)
    /// and stops once a round adds nothing new.
    ///
    /// Unlike the naive design, this routes its own output through
    /// `on_block` rather than splicing `(hash(block), block)` into the store
    /// directly: the producer computed `state_root` honestly, so the
    /// idempotent, validating path costs nothing extra and the store never
    /// carries a block that skipped `on_block`'s bookkeeping.
    pub fn produce_block(
        &mut self,
        slot: Slot,
        proposer_index: ValidatorIndex,
    ) -> Result<Block, ForkChoiceError> {
        let expected_proposer = slot.0 % self.config.num_validators;
        if proposer_index.0 != expected_proposer {
            return Err(ForkChoiceError::InvalidProposer);
        }

        let parent = self.get_proposal_head(slot);
        let base_state = self
            .states
            .get(&parent)
            .ok_or(ForkChoiceError::UnknownHeadState)?;
        let advanced_state = base_state.process_slots(slot)?;
        let parent_root = hash_tree_root(&advanced_state.latest_block_header);

        let mut voter_ids: Vec<u64> = self
            .latest_known_votes
            .keys()
            .map(|validator_index| validator_index.0)
            .collect();
        voter_ids.sort_unstable();

        let mut attestations = containers::Attestations::default();
        loop {
            let trial_block = Block {
                slot,
                proposer_index,
                parent_root,
                state_root: Bytes32::zero(),
                body: containers::BlockBody {
                    attestations: attestations.clone(),
                },
            };
            let trial_post_state = advanced_state.process_block(&trial_block)?;

            let mut grew = false;
            for &voter_id in &voter_ids {
                let checkpoint = self.latest_known_votes[&ValidatorIndex(voter_id)];
                if !self.blocks.contains_key(&checkpoint.root) {
                    continue;
                }
                if already_attests(&attestations, voter_id, checkpoint) {
                    continue;
                }

                let candidate = SignedVote {
                    data: Vote {
                        validator_id: containers::Uint64(voter_id),
                        slot,
                        head: checkpoint,
                        target: checkpoint,
                        source: trial_post_state.latest_justified,
                    },
                    signature: Bytes32::zero(),
                };
                attestations
                    .push(candidate)
                    .expect("attestations exceed VALIDATOR_REGISTRY_LIMIT");
                grew = true;
            }

            if !grew {
                break;
            }
        }

        let mut block = Block {
            slot,
            proposer_index,
            parent_root,
            state_root: Bytes32::zero(),
            body: containers::BlockBody { attestations },
        };
        let final_post_state = advanced_state.process_block(&block)?;
        block.state_root = hash_tree_root(&final_post_state);

        self.on_block(block.clone())?;
        // A proposer trusts its own output immediately rather than waiting
        // for the vote-driven fork-choice walk `on_block` just ran to catch
        // up with it (§4.5.5 step 5's "set head = hash(block)").
        self.head = hash_tree_root(&block);
        Ok(block)
    }
}

fn already_attests(
    attestations: &containers::Attestations,
    validator_id: u64,
    checkpoint: Checkpoint,
) -> bool {
    for i in 0..attestations.len_u64() {
        let existing = attestations
            .get(i)
            .expect("attestation index within block body bounds");
        if existing.data.validator_id.0 == validator_id && existing.data.target == checkpoint {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use containers::{Uint64, Validator};

    fn genesis_store(num_validators: u64) -> Store {
        let config = Config::new(num_validators, 0);
        let validators = (0..num_validators)
            .map(|i| Validator::from_hex_pubkey(&format!("0x{:0>104}", i)).unwrap())
            .collect();
        let state = State::generate_genesis_state(config, validators);
        let block = state.genesis_block();
        get_forkchoice_store(state, block, config)
    }

    #[test]
    fn store_starts_with_head_at_the_anchor() {
        let store = genesis_store(2);
        let anchor_root = *store.blocks.keys().next().unwrap();
        assert_eq!(store.head, anchor_root);
        assert_eq!(store.safe_target, anchor_root);
    }

    #[test]
    fn on_block_with_unknown_parent_is_rejected() {
        let mut store = genesis_store(2);
        let block = Block {
            slot: Slot(1),
            proposer_index: ValidatorIndex(1),
            parent_root: containers::hash_tree_root(&Slot(u64::MAX)),
            state_root: Bytes32::zero(),
            body: containers::BlockBody::default(),
        };
        assert!(matches!(
            store.on_block(block),
            Err(ForkChoiceError::UnknownParent(_))
        ));
    }

    #[test]
    fn produce_block_sets_head_to_its_own_block() {
        // §4.5.5 step 5: the producer short-circuits re-entry through
        // `on_block` and moves the head to its own block directly.
        let mut store = genesis_store(2);
        let block = store.produce_block(Slot(1), ValidatorIndex(1)).unwrap();
        assert_eq!(block.slot, Slot(1));
        assert_eq!(store.head, hash_tree_root(&block));
    }

    #[test]
    fn rejects_the_wrong_proposer() {
        let mut store = genesis_store(2);
        assert!(matches!(
            store.produce_block(Slot(1), ValidatorIndex(0)),
            Err(ForkChoiceError::InvalidProposer)
        ));
    }

    #[test]
    fn on_block_without_votes_leaves_head_at_the_justified_root() {
        // §4.4 step 1: with no votes, the head stays at the fork-choice root,
        // even once a child block has been ingested directly via `on_block`
        // (bypassing `produce_block`'s own head-setting shortcut).
        let mut store = genesis_store(2);
        let anchor_root = store.head;
        let genesis_state = store.states[&anchor_root].clone();
        let advanced = genesis_state.process_slots(Slot(1)).unwrap();
        let parent_root = hash_tree_root(&advanced.latest_block_header);
        let block = Block {
            slot: Slot(1),
            proposer_index: ValidatorIndex(1),
            parent_root,
            state_root: Bytes32::zero(),
            body: containers::BlockBody::default(),
        };
        let post_state = advanced.process_block(&block).unwrap();
        let mut block = block;
        block.state_root = hash_tree_root(&post_state);

        store.on_block(block).unwrap();
        assert_eq!(store.head, anchor_root);
    }

    #[test]
    fn a_vote_for_a_child_block_moves_the_head_to_it() {
        let mut store = genesis_store(2);
        let anchor_root = store.head;
        let anchor_checkpoint = store.latest_justified;
        let genesis_state = store.states[&anchor_root].clone();
        let advanced = genesis_state.process_slots(Slot(1)).unwrap();
        let parent_root = hash_tree_root(&advanced.latest_block_header);
        let block = Block {
            slot: Slot(1),
            proposer_index: ValidatorIndex(1),
            parent_root,
            state_root: Bytes32::zero(),
            body: containers::BlockBody::default(),
        };
        let post_state = advanced.process_block(&block).unwrap();
        let mut block = block;
        block.state_root = hash_tree_root(&post_state);
        let block_root = hash_tree_root(&block);

        store.on_block(block).unwrap();
        assert_eq!(store.head, anchor_root);

        let target = Checkpoint::new(block_root, Slot(1));
        let signed_vote = SignedVote {
            data: Vote {
                validator_id: Uint64(0),
                slot: Slot(1),
                head: target,
                target,
                source: anchor_checkpoint,
            },
            signature: Bytes32::zero(),
        };
        store.on_attestation(signed_vote, true).unwrap();
        store.update_head();
        assert_eq!(store.head, block_root);
    }

    #[test]
    fn tick_interval_advances_time_monotonically() {
        let mut store = genesis_store(2);
        let before = store.time;
        store.tick_interval(false);
        assert_eq!(store.time, before + 1);
    }
}
