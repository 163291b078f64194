use thiserror::Error;

/// Errors the state transition function can return. The store remains
/// unchanged whenever one of these is returned — see `State::state_transition`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("block slot {block_slot} is not valid for state at slot {state_slot}")]
    InvalidSlot { state_slot: u64, block_slot: u64 },

    #[error("proposer index {got} does not match expected proposer {expected} for this slot")]
    InvalidProposer { expected: u64, got: u64 },

    #[error("block.parent_root does not match the hash of state.latest_block_header")]
    ParentRootMismatch,

    #[error("computed post-state root does not match the declared block.state_root")]
    StateRootMismatch,

    #[error("attestation source slot {0} is beyond the historical root list")]
    InvalidSourceSlot(u64),

    #[error("attestation target slot {0} is beyond the historical root list")]
    InvalidTargetSlot(u64),

    #[error("attestation validator_id {0} is not a registered validator")]
    InvalidVoter(u64),
}
