use crate::{Bytes32, Checkpoint, Slot, Uint64};
use serde::{Deserialize, Serialize};
use ssz_derive::Ssz;

/// A validator's declared `head`, `target`, and `source` checkpoint at a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Ssz, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub validator_id: Uint64,
    pub slot: Slot,
    pub head: Checkpoint,
    pub target: Checkpoint,
    pub source: Checkpoint,
}

/// A `Vote` plus an opaque signature. The signature scheme is not fixed by
/// the core; see `SignatureVerifier`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Ssz, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedVote {
    pub data: Vote,
    pub signature: Bytes32,
}

/// Pluggable signature verifier consumed by the fork-choice store (§6). When
/// absent, every structurally valid attestation is accepted: the core itself
/// never hard-codes a signature scheme.
pub trait SignatureVerifier {
    fn verify(&self, signed_vote: &SignedVote) -> bool;
}

/// The default verifier used when no collaborator is supplied: accepts
/// everything, deferring entirely to structural validation.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAllVerifier;

impl SignatureVerifier for AcceptAllVerifier {
    fn verify(&self, _signed_vote: &SignedVote) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_all_verifier_accepts_every_vote() {
        let verifier = AcceptAllVerifier;
        assert!(verifier.verify(&SignedVote::default()));
    }
}
