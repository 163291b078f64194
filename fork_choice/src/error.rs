use containers::{Bytes32, TransitionError};
use thiserror::Error;

/// Errors the store can return while ingesting ticks, votes, and blocks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForkChoiceError {
    #[error("block's parent {0:?} is not known to the store")]
    UnknownParent(Bytes32),

    #[error("state transition rejected the block")]
    Transition(#[from] TransitionError),

    #[error("the store's head block has no corresponding state")]
    UnknownHeadState,

    #[error("a signed vote failed signature verification")]
    InvalidSignature,

    #[error("attestation failed structural validation")]
    InvalidAttestation,

    #[error("proposer index does not match the expected slot proposer")]
    InvalidProposer,
}
