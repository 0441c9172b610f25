//! Per-transaction economy effects: burn splits, fee routing, baselines.

use crate::burn::{compute_burn, get_burn_rate, MINER_BURN_SHARE_BPS};
use crate::dividend::{add_holding, remove_holding};
use crate::statedb::StateDB;
use crate::supply::{
    add_total_burned, add_total_burned_gas, add_total_burned_transfers,
    add_total_dividends_minted, add_total_miner_burn_share, get_total_minted, set_total_minted,
};
use olivetum_params::{max_supply, RuntimeParams};
use olivetum_types::{Address, U256};
use tracing::debug;

const BPS_DENOMINATOR: u64 = 10_000;

/// Supply totals carried over from before the economy fork tracked them
/// on chain, seeded exactly at the fork block.
fn baseline_burned() -> U256 {
    U256::from_dec_str("1166812191093119704612").expect("literal")
}

fn baseline_miner_burn_share() -> U256 {
    U256::from_dec_str("2924341331060450388").expect("literal")
}

/// Seeds the cumulative burn counters when the chain reaches exactly the
/// economy fork block. A no-op at every other height.
pub fn apply_economy_baseline(state: &mut dyn StateDB, runtime: &RuntimeParams, number: u64) {
    let Some(fork) = runtime.forks().economy else {
        return;
    };
    if fork == 0 || number != fork {
        return;
    }
    add_total_burned(state, baseline_burned());
    add_total_burned_transfers(state, baseline_burned());
    add_total_miner_burn_share(state, baseline_miner_burn_share());
    debug!(number, "economy baseline applied");
}

/// Splits a burn into the destroyed part and the miner share. The miner
/// share only exists once the burn-share fork is active.
fn split_burn(burn: U256, miner_share_active: bool) -> (U256, U256) {
    if burn.is_zero() || !miner_share_active {
        return (burn, U256::zero());
    }
    let miner_share = burn * U256::from(MINER_BURN_SHARE_BPS) / U256::from(BPS_DENOMINATOR);
    (burn - miner_share, miner_share)
}

/// Moves `value` from `from` to `to`, applying the transfer burn when the
/// economy fork is active. Holdings are maintained on both sides; the miner
/// share is credited to the coinbase and queued for dividends.
#[allow(clippy::too_many_arguments)]
pub fn apply_value_transfer(
    state: &mut dyn StateDB,
    runtime: &RuntimeParams,
    from: Address,
    to: Address,
    value: U256,
    coinbase: Address,
    number: u64,
    now: u64,
) {
    if value.is_zero() {
        return;
    }
    state.sub_balance(from, value);
    remove_holding(state, from, value, now);

    if !runtime.is_economy_fork_active(number) {
        state.add_balance(to, value);
        add_holding(state, to, value, now);
        return;
    }

    let burn = compute_burn(value, get_burn_rate(state));
    let (net_burn, miner_share) = split_burn(burn, runtime.is_burn_share_fork_active(number));

    let credited = value - burn;
    if !credited.is_zero() {
        state.add_balance(to, credited);
        add_holding(state, to, credited, now);
    }
    if !miner_share.is_zero() {
        state.add_balance(coinbase, miner_share);
        add_holding(state, coinbase, miner_share, now);
        add_total_miner_burn_share(state, miner_share);
    }
    if !net_burn.is_zero() {
        add_total_burned(state, net_burn);
        add_total_burned_transfers(state, net_burn);
    }
}

/// Routes a gas fee (already debited from the sender by the host) to the
/// coinbase, burning a share when the economy fork is active. Returns the
/// amount credited to the coinbase.
pub fn apply_gas_fee(
    state: &mut dyn StateDB,
    runtime: &RuntimeParams,
    fee: U256,
    coinbase: Address,
    number: u64,
    now: u64,
) -> U256 {
    if fee.is_zero() {
        return U256::zero();
    }
    if !runtime.is_economy_fork_active(number) {
        state.add_balance(coinbase, fee);
        add_holding(state, coinbase, fee, now);
        return fee;
    }

    let burn = compute_burn(fee, get_burn_rate(state));
    let (net_burn, miner_share) = split_burn(burn, runtime.is_burn_share_fork_active(number));

    // The miner share comes straight back to the coinbase, so the credited
    // fee is everything except the destroyed portion.
    let credited = fee - net_burn;
    debug_assert_eq!(credited, fee - burn + miner_share);
    if !credited.is_zero() {
        state.add_balance(coinbase, credited);
        add_holding(state, coinbase, credited, now);
    }
    if !miner_share.is_zero() {
        add_total_miner_burn_share(state, miner_share);
    }
    if !net_burn.is_zero() {
        add_total_burned(state, net_burn);
        add_total_burned_gas(state, net_burn);
    }
    credited
}

/// Mints the miner tip owed for a dividend claim: the burn share of the
/// virtual burn on the reward, bounded by the remaining supply. Also tracks
/// the claimed reward in the dividends-minted counter.
pub fn mint_dividend_claim_tip(
    state: &mut dyn StateDB,
    reward: U256,
    coinbase: Address,
    now: u64,
) -> U256 {
    if reward.is_zero() {
        return U256::zero();
    }
    add_total_dividends_minted(state, reward);

    let burn_rate = get_burn_rate(state);
    if burn_rate == 0 {
        return U256::zero();
    }
    let virtual_burn = reward * U256::from(burn_rate) / U256::from(BPS_DENOMINATOR);
    if virtual_burn.is_zero() {
        return U256::zero();
    }
    let tip = virtual_burn * U256::from(MINER_BURN_SHARE_BPS) / U256::from(BPS_DENOMINATOR);
    if tip.is_zero() {
        return U256::zero();
    }

    let minted = get_total_minted(state);
    let cap = max_supply();
    if minted >= cap {
        return U256::zero();
    }
    let tip = tip.min(cap - minted);
    if tip.is_zero() {
        return U256::zero();
    }
    set_total_minted(state, minted + tip);
    state.add_balance(coinbase, tip);
    add_holding(state, coinbase, tip, now);
    tip
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::burn::set_burn_rate;
    use crate::supply::{
        get_total_burned, get_total_burned_gas, get_total_burned_transfers,
        get_total_dividends_minted, get_total_miner_burn_share,
    };
    use crate::MemoryState;
    use olivetum_params::ForkSchedule;
    use olivetum_types::olivo;

    fn economy_runtime() -> RuntimeParams {
        let runtime = RuntimeParams::new();
        runtime.set_forks(ForkSchedule {
            economy: Some(1),
            ..ForkSchedule::default()
        });
        runtime
    }

    #[test]
    fn test_transfer_burn_split() {
        let mut state = MemoryState::new();
        let runtime = economy_runtime();
        let from = Address::repeat_byte(1);
        let to = Address::repeat_byte(2);
        let coinbase = Address::repeat_byte(0xc0);
        state.add_balance(from, olivo(1_000));

        let value = olivo(100);
        apply_value_transfer(&mut state, &runtime, from, to, value, coinbase, 1, 1_000);

        // Default 50 bps burn, 25 bps of that to the miner.
        let burn = value * U256::from(50u64) / U256::from(10_000u64);
        let miner_share = burn * U256::from(25u64) / U256::from(10_000u64);
        let net_burn = burn - miner_share;

        assert_eq!(state.get_balance(to), value - burn);
        assert_eq!(state.get_balance(coinbase), miner_share);
        assert_eq!(state.get_balance(from), olivo(900));
        assert_eq!(get_total_burned(&state), net_burn);
        assert_eq!(get_total_burned_transfers(&state), net_burn);
        assert_eq!(get_total_miner_burn_share(&state), miner_share);
        assert!(get_total_burned_gas(&state).is_zero());
    }

    #[test]
    fn test_transfer_pre_fork_is_plain() {
        let mut state = MemoryState::new();
        let runtime = RuntimeParams::new(); // economy fork at 260000
        let from = Address::repeat_byte(1);
        let to = Address::repeat_byte(2);
        state.add_balance(from, olivo(10));

        apply_value_transfer(
            &mut state,
            &runtime,
            from,
            to,
            olivo(10),
            Address::repeat_byte(0xc0),
            1,
            1_000,
        );
        assert_eq!(state.get_balance(to), olivo(10));
        assert!(get_total_burned(&state).is_zero());
    }

    #[test]
    fn test_gas_fee_split() {
        let mut state = MemoryState::new();
        let runtime = economy_runtime();
        let coinbase = Address::repeat_byte(0xee);
        set_burn_rate(&mut state, 150);

        let fee = U256::from(21_000u64) * U256::from(1_000u64);
        let credited = apply_gas_fee(&mut state, &runtime, fee, coinbase, 1, 500);

        let burn = fee * U256::from(150u64) / U256::from(10_000u64);
        let miner_share = burn * U256::from(25u64) / U256::from(10_000u64);
        let net_burn = burn - miner_share;

        assert_eq!(credited, fee - net_burn);
        assert_eq!(state.get_balance(coinbase), fee - net_burn);
        assert_eq!(get_total_burned(&state), net_burn);
        assert_eq!(get_total_burned_gas(&state), net_burn);
        assert!(get_total_burned_transfers(&state).is_zero());
        assert_eq!(get_total_miner_burn_share(&state), miner_share);
    }

    #[test]
    fn test_baseline_applies_only_at_fork_block() {
        let mut state = MemoryState::new();
        let runtime = RuntimeParams::new();
        let mut forks = runtime.forks();
        forks.economy = Some(10);
        runtime.set_forks(forks);

        apply_economy_baseline(&mut state, &runtime, 9);
        assert!(get_total_burned(&state).is_zero());

        apply_economy_baseline(&mut state, &runtime, 10);
        assert_eq!(get_total_burned(&state), baseline_burned());
        assert_eq!(get_total_burned_transfers(&state), baseline_burned());
        assert_eq!(get_total_miner_burn_share(&state), baseline_miner_burn_share());
        assert!(get_total_burned_gas(&state).is_zero());

        // Not applied twice.
        apply_economy_baseline(&mut state, &runtime, 11);
        assert_eq!(get_total_burned(&state), baseline_burned());
    }

    #[test]
    fn test_claim_tip_arithmetic_and_cap() {
        let mut state = MemoryState::new();
        let coinbase = Address::repeat_byte(0xcc);
        let reward = olivo(100);

        let tip = mint_dividend_claim_tip(&mut state, reward, coinbase, 1_000);
        // floor(floor(100 * 50/10000) * 25/10000)
        let virtual_burn = reward * U256::from(50u64) / U256::from(10_000u64);
        let expected = virtual_burn * U256::from(25u64) / U256::from(10_000u64);
        assert_eq!(tip, expected);
        assert_eq!(state.get_balance(coinbase), expected);
        assert_eq!(get_total_dividends_minted(&state), reward);
        assert_eq!(get_total_minted(&state), expected);

        // At the cap, nothing more is minted but the dividend counter grows.
        set_total_minted(&mut state, max_supply());
        let tip = mint_dividend_claim_tip(&mut state, reward, coinbase, 1_000);
        assert!(tip.is_zero());
        assert_eq!(get_total_minted(&state), max_supply());
        assert_eq!(get_total_dividends_minted(&state), reward * U256::from(2u64));
    }
}
