pub mod error;
pub mod head;
pub mod store;

pub use error::ForkChoiceError;
pub use head::get_fork_choice_head;
pub use store::{
    get_forkchoice_store, get_forkchoice_store_with_verifier, Store, INTERVALS_PER_SLOT,
    SECONDS_PER_INTERVAL, SECONDS_PER_SLOT,
};
