//! Per-address off-session spending budgets.
//!
//! Each sender gets a `(windowStart, spent)` pair stored under the
//! off-session-max contract. A window change resets the spent amount on the
//! next write.

use crate::slots::{h256_from_u256, h256_from_u64, tagged_addr_slot, u256_from_h256, u64_from_h256};
use crate::statedb::{ensure_account, StateDB};
use olivetum_params::{off_session_window_start, RuntimeParams, OFF_SESSION_MAX_CONTRACT};
use olivetum_types::{Address, U256};
use thiserror::Error;

const WINDOW_TAG: u8 = 0x01;
const SPENT_TAG: u8 = 0x02;

/// The cumulative off-session budget for the window would be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("over off-session budget")]
pub struct OverOffSessionBudget;

fn stored_window(state: &dyn StateDB, addr: Address) -> u64 {
    u64_from_h256(state.get_state(OFF_SESSION_MAX_CONTRACT, tagged_addr_slot(WINDOW_TAG, addr)))
}

fn stored_spent(state: &dyn StateDB, addr: Address) -> U256 {
    u256_from_h256(state.get_state(OFF_SESSION_MAX_CONTRACT, tagged_addr_slot(SPENT_TAG, addr)))
}

/// The amount already spent by `addr` in the window covering `now`; zero if
/// the stored window is stale.
pub fn off_session_budget_spent(
    state: &dyn StateDB,
    runtime: &RuntimeParams,
    addr: Address,
    now: u64,
) -> U256 {
    let window = off_session_window_start(now, runtime.session_tz_offset());
    if stored_window(state, addr) != window {
        return U256::zero();
    }
    stored_spent(state, addr)
}

/// Accounts `amount` against the sender's window budget, rolling the window
/// forward when it changed. Fails without writing when the cumulative spend
/// would exceed the configured cap.
pub fn update_off_session_budget(
    state: &mut dyn StateDB,
    runtime: &RuntimeParams,
    addr: Address,
    amount: U256,
    now: u64,
) -> Result<(), OverOffSessionBudget> {
    if amount.is_zero() {
        return Ok(());
    }
    let limit = runtime.off_session_max_per_tx();
    if limit.is_zero() {
        return Ok(());
    }

    let window = off_session_window_start(now, runtime.session_tz_offset());
    let spent = if stored_window(state, addr) != window {
        U256::zero()
    } else {
        stored_spent(state, addr)
    };
    let next = spent.saturating_add(amount);
    if next > limit {
        return Err(OverOffSessionBudget);
    }

    ensure_account(state, OFF_SESSION_MAX_CONTRACT);
    state.set_state(
        OFF_SESSION_MAX_CONTRACT,
        tagged_addr_slot(WINDOW_TAG, addr),
        h256_from_u64(window),
    );
    state.set_state(
        OFF_SESSION_MAX_CONTRACT,
        tagged_addr_slot(SPENT_TAG, addr),
        h256_from_u256(next),
    );
    Ok(())
}
