//! Per-sender transaction rate accounting.
//!
//! Usage is a `{count, start, epoch}` triple per sender. A new hour or a
//! bumped global epoch resets the count; bumping the epoch (done whenever a
//! rate limit is reconfigured) invalidates every stored counter at once.

use crate::slots::{h256_from_u64, tx_rate_slot, u64_from_h256};
use crate::statedb::{ensure_account, StateDB};
use olivetum_params::{is_session, RuntimeParams, TX_RATE_CONTRACT};
use olivetum_types::{Address, H256};

const RATE_WINDOW_SECONDS: u64 = 60 * 60;

const COUNT_FIELD: u8 = 0;
const START_FIELD: u8 = 1;
const EPOCH_FIELD: u8 = 2;

fn epoch_slot() -> H256 {
    h256_from_u64(1)
}

/// Per-sender usage within the current window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxRateUsage {
    pub count: u64,
    pub start: u64,
    pub epoch: u64,
}

pub fn get_tx_rate_epoch(state: &dyn StateDB) -> u64 {
    u64_from_h256(state.get_state(TX_RATE_CONTRACT, epoch_slot()))
}

fn set_tx_rate_epoch(state: &mut dyn StateDB, epoch: u64) {
    ensure_account(state, TX_RATE_CONTRACT);
    state.set_state(TX_RATE_CONTRACT, epoch_slot(), h256_from_u64(epoch));
}

/// Invalidate all stored counters by advancing the global epoch.
pub fn reset_tx_rate_usage(state: &mut dyn StateDB) {
    let next_epoch = get_tx_rate_epoch(state) + 1;
    set_tx_rate_epoch(state, next_epoch);
}

pub fn get_tx_rate_usage(state: &dyn StateDB, addr: Address) -> TxRateUsage {
    TxRateUsage {
        count: u64_from_h256(state.get_state(TX_RATE_CONTRACT, tx_rate_slot(addr, COUNT_FIELD))),
        start: u64_from_h256(state.get_state(TX_RATE_CONTRACT, tx_rate_slot(addr, START_FIELD))),
        epoch: u64_from_h256(state.get_state(TX_RATE_CONTRACT, tx_rate_slot(addr, EPOCH_FIELD))),
    }
}

pub fn set_tx_rate_usage(state: &mut dyn StateDB, addr: Address, usage: TxRateUsage) {
    ensure_account(state, TX_RATE_CONTRACT);
    state.set_state(
        TX_RATE_CONTRACT,
        tx_rate_slot(addr, COUNT_FIELD),
        h256_from_u64(usage.count),
    );
    state.set_state(
        TX_RATE_CONTRACT,
        tx_rate_slot(addr, START_FIELD),
        h256_from_u64(usage.start),
    );
    state.set_state(
        TX_RATE_CONTRACT,
        tx_rate_slot(addr, EPOCH_FIELD),
        h256_from_u64(usage.epoch),
    );
}

pub fn clear_tx_rate_usage(state: &mut dyn StateDB, addr: Address) {
    set_tx_rate_usage(state, addr, TxRateUsage::default());
}

/// The number of transactions `addr` may still send at `now`, under the
/// session or off-session limit as appropriate.
pub fn tx_allowance(
    state: &dyn StateDB,
    runtime: &RuntimeParams,
    addr: Address,
    now: u64,
) -> u64 {
    let limit = if is_session(now, runtime.session_tz_offset()) {
        runtime.tx_rate_limit()
    } else {
        runtime.off_session_tx_rate()
    };
    let epoch = get_tx_rate_epoch(state);
    let usage = get_tx_rate_usage(state, addr);
    if usage.epoch != epoch || now.saturating_sub(usage.start) >= RATE_WINDOW_SECONDS {
        return limit;
    }
    limit.saturating_sub(usage.count)
}
