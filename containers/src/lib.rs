pub mod block;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod justifiable;
pub mod slot;
pub mod state;
pub mod types;
pub mod validator;
pub mod vote;

pub use block::{hash_tree_root, Attestations, Block, BlockBody, BlockHeader};
pub use checkpoint::Checkpoint;
pub use config::{Config, GenesisConfig};
pub use error::TransitionError;
pub use justifiable::is_justifiable_slot;
pub use slot::Slot;
pub use state::State;
pub use types::{
    Bytes32, HistoricalBlockHashes, JustificationRoots, JustificationsValidators, JustifiedSlots,
    Uint64, ValidatorIndex, Validators, HISTORICAL_ROOTS_LIMIT, VALIDATOR_REGISTRY_LIMIT,
};
pub use validator::{PubKey, Validator};
pub use vote::{AcceptAllVerifier, SignatureVerifier, SignedVote, Vote};

pub use types::Bytes32 as Root;

pub use ssz;
