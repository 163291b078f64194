use serde::{Deserialize, Serialize};
use ssz_derive::Ssz;

pub use ssz::H256;

// Type-level constants for SSZ collection limits. These are wire-relevant:
// every implementation of this protocol must agree on them bit-for-bit.
use typenum::{U1073741824, U262144, U4096};

/// 2^18 — the maximum number of historical roots / justification entries tracked.
pub const HISTORICAL_ROOTS_LIMIT: u64 = 1 << 18;
/// 2^12 — the maximum number of validators in the registry.
pub const VALIDATOR_REGISTRY_LIMIT: u64 = 1 << 12;

/// A 32-byte Merkle root or other opaque 32-byte value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Ssz, Default, Serialize, Deserialize)]
pub struct Bytes32(pub H256);

impl Bytes32 {
    pub fn zero() -> Self {
        Self(H256::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<H256> for Bytes32 {
    fn from(value: H256) -> Self {
        Self(value)
    }
}

/// An unsigned 64-bit integer, wrapped so it can be used as a distinct SSZ field
/// type (e.g. a validator id) rather than an anonymous `u64`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Ssz, Default, Serialize, Deserialize)]
pub struct Uint64(pub u64);

/// Index of a validator within `State::validators`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Ssz, Default, Serialize, Deserialize)]
pub struct ValidatorIndex(pub u64);

impl From<u64> for ValidatorIndex {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// List of historical block roots, one entry per slot since genesis.
pub type HistoricalBlockHashes = ssz::PersistentList<Bytes32, U262144>;

/// The validator registry.
pub type Validators = ssz::PersistentList<crate::validator::Validator, U4096>;

/// Roots currently tracked in the flattened justifications map.
pub type JustificationRoots = ssz::PersistentList<Bytes32, U262144>;

/// Bitlist tracking, per historical slot, whether that slot has been justified.
pub type JustifiedSlots = ssz::BitList<U262144>;

/// Flattened `justifications_roots.len() * num_validators`-sized bitlist; see
/// `State::justifications` for how this is folded into a `root -> bitvector` map.
pub type JustificationsValidators = ssz::BitList<U1073741824>;
