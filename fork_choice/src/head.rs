//! The fork-choice head algorithm (component C5): a restricted LMD-GHOST
//! walk over whatever blocks the store currently knows about.

use containers::{Block, Bytes32, Checkpoint, ValidatorIndex};
use std::collections::HashMap;

/// Greedily descend from `root` picking, at every fork, the child with the
/// most accumulated vote weight (ties broken by higher slot, then higher
/// hash).
///
/// `root` must name a block already present in `blocks`; the store never
/// constructs a fork-choice root that isn't (every anchor and justified
/// checkpoint root is inserted before it can be referenced here).
pub fn get_fork_choice_head(
    blocks: &HashMap<Bytes32, Block>,
    root: Bytes32,
    votes: &HashMap<ValidatorIndex, Checkpoint>,
    min_score: usize,
) -> Bytes32 {
    if votes.is_empty() {
        return root;
    }

    let root_slot = blocks
        .get(&root)
        .expect("fork-choice root must name a known block")
        .slot;

    let mut vote_weights: HashMap<Bytes32, usize> = HashMap::new();
    for checkpoint in votes.values() {
        let mut curr = checkpoint.root;
        while let Some(block) = blocks.get(&curr) {
            if block.slot.0 <= root_slot.0 {
                break;
            }
            *vote_weights.entry(curr).or_insert(0) += 1;
            curr = block.parent_root;
        }
    }

    let mut child_map: HashMap<Bytes32, Vec<Bytes32>> = HashMap::new();
    for (hash, block) in blocks {
        if block.slot.0 <= root_slot.0 {
            continue;
        }
        if vote_weights.get(hash).copied().unwrap_or(0) >= min_score {
            child_map.entry(block.parent_root).or_default().push(*hash);
        }
    }

    let mut curr = root;
    loop {
        let children = match child_map.get(&curr) {
            Some(list) if !list.is_empty() => list,
            _ => return curr,
        };

        curr = *children
            .iter()
            .max_by(|a, b| {
                let wa = vote_weights.get(*a).copied().unwrap_or(0);
                let wb = vote_weights.get(*b).copied().unwrap_or(0);
                wa.cmp(&wb)
                    .then_with(|| blocks[*a].slot.cmp(&blocks[*b].slot))
                    .then_with(|| (*a).cmp(b))
            })
            .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use containers::{BlockBody, Slot};

    fn block(slot: u64, parent: Bytes32) -> Block {
        Block {
            slot: Slot(slot),
            proposer_index: Default::default(),
            parent_root: parent,
            state_root: Bytes32::zero(),
            body: BlockBody::default(),
        }
    }

    fn root_hash(n: u64) -> Bytes32 {
        // A cheap way to get distinct, deterministic roots for test fixtures.
        containers::hash_tree_root(&Slot(n))
    }

    #[test]
    fn no_votes_stays_at_root() {
        let root = root_hash(0);
        let mut blocks = HashMap::new();
        blocks.insert(root, block(0, Bytes32::zero()));
        let head = get_fork_choice_head(&blocks, root, &HashMap::new(), 0);
        assert_eq!(head, root);
    }

    #[test]
    fn heavier_branch_wins() {
        let root = root_hash(0);
        let a = root_hash(1);
        let b = root_hash(2);
        let mut blocks = HashMap::new();
        blocks.insert(root, block(0, Bytes32::zero()));
        blocks.insert(a, block(1, root));
        blocks.insert(b, block(1, root));

        let mut votes = HashMap::new();
        votes.insert(ValidatorIndex(0), Checkpoint::new(a, Slot(1)));
        votes.insert(ValidatorIndex(1), Checkpoint::new(a, Slot(1)));
        votes.insert(ValidatorIndex(2), Checkpoint::new(b, Slot(1)));

        let head = get_fork_choice_head(&blocks, root, &votes, 0);
        assert_eq!(head, a);
    }

    #[test]
    fn min_score_filters_out_light_children() {
        let root = root_hash(0);
        let a = root_hash(1);
        let mut blocks = HashMap::new();
        blocks.insert(root, block(0, Bytes32::zero()));
        blocks.insert(a, block(1, root));

        let mut votes = HashMap::new();
        votes.insert(ValidatorIndex(0), Checkpoint::new(a, Slot(1)));

        let head = get_fork_choice_head(&blocks, root, &votes, 5);
        assert_eq!(head, root);
    }

    #[test]
    fn vote_for_a_descendant_counts_every_ancestor_above_root() {
        let root = root_hash(0);
        let a = root_hash(1);
        let b = root_hash(2);
        let mut blocks = HashMap::new();
        blocks.insert(root, block(0, Bytes32::zero()));
        blocks.insert(a, block(1, root));
        blocks.insert(b, block(2, a));

        let mut votes = HashMap::new();
        votes.insert(ValidatorIndex(0), Checkpoint::new(b, Slot(2)));

        let head = get_fork_choice_head(&blocks, root, &votes, 0);
        assert_eq!(head, b);
    }
}
