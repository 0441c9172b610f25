//! Block reward emission.

use olivetum_params::{max_supply, reward_base, reward_floor, RuntimeParams, REWARD_HALVING_INTERVAL};
use olivetum_state::{add_holding, get_total_minted, set_total_minted, StateDB};
use olivetum_state::{compute_burn, get_burn_rate};
use olivetum_types::{Address, U256};
use tracing::debug;

/// Gross reward scheduled for a block: the base reward halved once per
/// elapsed interval since the reward fork, never below the floor.
pub fn reward_for_block(runtime: &RuntimeParams, number: u64) -> U256 {
    let mut reward = reward_base();
    let start = runtime.reward_fork_block();
    let floor = reward_floor();
    if number < start {
        return reward;
    }
    let interval = REWARD_HALVING_INTERVAL;
    if interval == 0 {
        return reward.max(floor);
    }
    let halvings = (number - start) / interval;
    for _ in 0..halvings {
        if reward <= floor {
            return floor;
        }
        reward = reward >> 1u32;
    }
    reward.max(floor)
}

/// Applies the block reward at finalization: mints up to the supply cap,
/// burns the configured share, credits the rest to the coinbase and
/// records it in the coinbase's dividend queue.
pub fn accumulate_rewards(
    state: &mut dyn StateDB,
    runtime: &RuntimeParams,
    coinbase: Address,
    number: u64,
    time: u64,
) {
    let scheduled = reward_for_block(runtime, number);
    if scheduled.is_zero() {
        return;
    }

    let minted = get_total_minted(state);
    let cap = max_supply();
    if minted >= cap {
        return;
    }
    let gross = scheduled.min(cap - minted);
    if gross.is_zero() {
        return;
    }

    let burn = compute_burn(gross, get_burn_rate(state));
    let payout = gross - burn;

    set_total_minted(state, minted + gross);

    if !payout.is_zero() {
        state.add_balance(coinbase, payout);
        add_holding(state, coinbase, payout, time);
    }
    debug!(number, %gross, %burn, %payout, "block reward applied");
}
