use containers::{
    Bytes32, Config, SignedVote, Slot, State, Uint64, Validator, ValidatorIndex, Vote,
};
use fork_choice::{get_forkchoice_store, Store};
use tracing::{info, level_filters::LevelFilter};

const NUM_VALIDATORS: u64 = 4;
const SLOTS_TO_RUN: u64 = 8;

fn demo_validators(count: u64) -> Vec<Validator> {
    (0..count)
        .map(|i| Validator::from_hex_pubkey(&format!("0x{:0>104}", i)).expect("valid pubkey hex"))
        .collect()
}

fn print_chain_status(store: &Store, slot: u64) {
    let head_block = store.blocks.get(&store.head);
    let head_slot = head_block.map(|b| b.slot.0).unwrap_or(0);

    println!("\n+===============================================================+");
    println!("  CHAIN STATUS: Current Slot: {slot} | Head Slot: {head_slot}");
    println!("+---------------------------------------------------------------+");
    println!("  Head Root:          0x{:x}", store.head.0);
    println!(
        "  Latest Justified:   Slot {:>5} | Root: 0x{:x}",
        store.latest_justified.slot.0, store.latest_justified.root.0
    );
    println!(
        "  Latest Finalized:   Slot {:>5} | Root: 0x{:x}",
        store.latest_finalized.slot.0, store.latest_finalized.root.0
    );
    println!("+===============================================================+\n");
}

/// A single-process simulation of the consensus core: it runs the state
/// transition function and fork-choice store locally, with every validator's
/// votes submitted immediately, rather than driving them over a network.
/// There is no peer-to-peer transport here — see `fork_choice::Store` and
/// `containers::State` for the actual protocol logic this drives.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let genesis_time = 0;
    let config = Config::new(NUM_VALIDATORS, genesis_time);
    let validators = demo_validators(NUM_VALIDATORS);
    let genesis_state = State::generate_genesis_state(config, validators);
    let genesis_block = genesis_state.genesis_block();

    info!(num_validators = NUM_VALIDATORS, "genesis state constructed");

    let mut store: Store = get_forkchoice_store(genesis_state, genesis_block, config);

    for slot in 1..=SLOTS_TO_RUN {
        let proposer_index = ValidatorIndex(slot % NUM_VALIDATORS);

        // `produce_block` ingests its own output through `on_block`, so the
        // head only moves once a validator actually votes for it.
        if let Err(err) = store.produce_block(Slot(slot), proposer_index) {
            tracing::warn!(slot, %err, "failed to produce block, skipping slot");
            store.tick_interval(false);
            continue;
        }

        // Every validator casts its vote for the current target off-chain;
        // the next `accept_new_votes` (driven by `tick_interval`) promotes
        // them and lets the head catch up with the chain.
        let target = store.get_vote_target();
        let source = store.latest_justified;
        for validator_id in 0..NUM_VALIDATORS {
            let vote = Vote {
                validator_id: Uint64(validator_id),
                slot: Slot(slot),
                head: target,
                target,
                source,
            };
            let signed_vote = SignedVote {
                data: vote,
                signature: Bytes32::zero(),
            };
            if let Err(err) = store.on_attestation(signed_vote, false) {
                tracing::warn!(slot, validator_id, %err, "attestation rejected");
            }
        }

        for interval in 0..fork_choice::INTERVALS_PER_SLOT {
            store.tick_interval(interval == 0);
        }

        print_chain_status(&store, slot);
    }
}
