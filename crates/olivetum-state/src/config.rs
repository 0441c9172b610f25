//! On-chain configuration slots and their runtime mirrors.
//!
//! Each management contract stores its value in slot zero. Loaders pull the
//! stored value into the runtime store at startup or reorg; setters are
//! invoked by the apply path when a validated management transaction lands.

use crate::rate_limit::reset_tx_rate_usage;
use crate::slots::{h256_from_u256, h256_from_u64, u256_from_h256, u64_from_h256};
use crate::statedb::{ensure_account, StateDB};
use olivetum_params::{
    decode_block_period, decode_burn_rate, decode_gas_limit, decode_min_tx_amount,
    decode_off_session_max_per_tx, decode_off_session_tx_rate, decode_session_tz_offset,
    decode_tx_rate_limit, RuntimeParams, BURN_CONTRACT, GAS_LIMIT_CONTRACT,
    MIN_TX_AMOUNT_CONTRACT, OFF_SESSION_MAX_CONTRACT, OFF_SESSION_RATE_CONTRACT, PERIOD_CONTRACT,
    SESSION_TZ_CONTRACT, TX_RATE_CONTRACT,
};
use olivetum_types::{Address, H256, U256};
use tracing::info;

fn read_u64_slot(state: &dyn StateDB, contract: Address) -> u64 {
    u64_from_h256(state.get_state(contract, H256::zero()))
}

fn write_u64_slot(state: &mut dyn StateDB, contract: Address, value: u64) {
    ensure_account(state, contract);
    state.set_state(contract, H256::zero(), h256_from_u64(value));
}

/// Mirror the stored block period into the runtime store, keeping the
/// runtime default when the slot is unset.
pub fn load_block_period(state: &dyn StateDB, runtime: &RuntimeParams) -> u64 {
    let stored = read_u64_slot(state, PERIOD_CONTRACT);
    if stored != 0 {
        runtime.set_block_period(stored);
        return stored;
    }
    runtime.block_period()
}

pub fn set_block_period(state: &mut dyn StateDB, runtime: &RuntimeParams, period: u64) {
    write_u64_slot(state, PERIOD_CONTRACT, period);
    runtime.set_block_period(period);
}

pub fn load_gas_limit(state: &dyn StateDB, runtime: &RuntimeParams) -> u64 {
    let stored = read_u64_slot(state, GAS_LIMIT_CONTRACT);
    if stored != 0 {
        runtime.set_gas_limit(stored);
        return stored;
    }
    runtime.gas_limit()
}

pub fn set_gas_limit(state: &mut dyn StateDB, runtime: &RuntimeParams, limit: u64) {
    write_u64_slot(state, GAS_LIMIT_CONTRACT, limit);
    runtime.set_gas_limit(limit);
}

pub fn load_min_tx_amount(state: &dyn StateDB, runtime: &RuntimeParams) -> U256 {
    let stored = u256_from_h256(state.get_state(MIN_TX_AMOUNT_CONTRACT, H256::zero()));
    if !stored.is_zero() {
        runtime.set_min_tx_amount(stored);
        return stored;
    }
    runtime.min_tx_amount()
}

pub fn set_min_tx_amount(state: &mut dyn StateDB, runtime: &RuntimeParams, amount: U256) {
    ensure_account(state, MIN_TX_AMOUNT_CONTRACT);
    state.set_state(MIN_TX_AMOUNT_CONTRACT, H256::zero(), h256_from_u256(amount));
    runtime.set_min_tx_amount(amount);
}

pub fn load_tx_rate_limit(state: &dyn StateDB, runtime: &RuntimeParams) -> u64 {
    let stored = read_u64_slot(state, TX_RATE_CONTRACT);
    if stored != 0 {
        runtime.set_tx_rate_limit(stored);
        return stored;
    }
    runtime.tx_rate_limit()
}

/// Writes the session rate limit and invalidates all stored usage counters.
pub fn set_tx_rate_limit(state: &mut dyn StateDB, runtime: &RuntimeParams, limit: u64) {
    write_u64_slot(state, TX_RATE_CONTRACT, limit);
    runtime.set_tx_rate_limit(limit);
    reset_tx_rate_usage(state);
}

pub fn load_off_session_tx_rate(state: &dyn StateDB, runtime: &RuntimeParams) -> u64 {
    let stored = read_u64_slot(state, OFF_SESSION_RATE_CONTRACT);
    if stored != 0 {
        runtime.set_off_session_tx_rate(stored);
        return stored;
    }
    runtime.off_session_tx_rate()
}

pub fn set_off_session_tx_rate(state: &mut dyn StateDB, runtime: &RuntimeParams, limit: u64) {
    write_u64_slot(state, OFF_SESSION_RATE_CONTRACT, limit);
    runtime.set_off_session_tx_rate(limit);
    reset_tx_rate_usage(state);
}

pub fn load_off_session_max_per_tx(state: &dyn StateDB, runtime: &RuntimeParams) -> U256 {
    let stored = u256_from_h256(state.get_state(OFF_SESSION_MAX_CONTRACT, H256::zero()));
    if !stored.is_zero() {
        runtime.set_off_session_max_per_tx(stored);
        return stored;
    }
    runtime.off_session_max_per_tx()
}

pub fn set_off_session_max_per_tx(state: &mut dyn StateDB, runtime: &RuntimeParams, amount: U256) {
    ensure_account(state, OFF_SESSION_MAX_CONTRACT);
    state.set_state(OFF_SESSION_MAX_CONTRACT, H256::zero(), h256_from_u256(amount));
    runtime.set_off_session_max_per_tx(amount);
}

pub fn load_session_tz_offset(state: &dyn StateDB, runtime: &RuntimeParams) -> i64 {
    let stored = read_u64_slot(state, SESSION_TZ_CONTRACT);
    if stored != 0 {
        let offset = stored as i64;
        runtime.set_session_tz_offset(offset);
        return offset;
    }
    runtime.session_tz_offset()
}

pub fn set_session_tz_offset(state: &mut dyn StateDB, runtime: &RuntimeParams, offset: i64) {
    write_u64_slot(state, SESSION_TZ_CONTRACT, offset as u64);
    runtime.set_session_tz_offset(offset);
}

/// Applies a validated management payload to its contract, mirroring the
/// decoded value into the runtime store. Returns false when the payload
/// fails to decode (the admission policy rejects those earlier; this guard
/// keeps the apply path total).
pub fn apply_management_payload(
    state: &mut dyn StateDB,
    runtime: &RuntimeParams,
    to: Address,
    data: &[u8],
) -> bool {
    match to {
        addr if addr == BURN_CONTRACT => {
            let Some(rate) = decode_burn_rate(data) else {
                return false;
            };
            crate::burn::set_burn_rate(state, rate);
            info!(rate, "burn rate updated");
            true
        }
        addr if addr == PERIOD_CONTRACT => {
            let Some(period) = decode_block_period(data) else {
                return false;
            };
            set_block_period(state, runtime, period);
            info!(period, "block period updated");
            true
        }
        addr if addr == GAS_LIMIT_CONTRACT => {
            let Some(limit) = decode_gas_limit(data) else {
                return false;
            };
            set_gas_limit(state, runtime, limit);
            info!(limit, "gas limit updated");
            true
        }
        addr if addr == MIN_TX_AMOUNT_CONTRACT => {
            let Some(amount) = decode_min_tx_amount(data) else {
                return false;
            };
            set_min_tx_amount(state, runtime, amount);
            info!(%amount, "min tx amount updated");
            true
        }
        addr if addr == TX_RATE_CONTRACT => {
            let Some(limit) = decode_tx_rate_limit(data) else {
                return false;
            };
            set_tx_rate_limit(state, runtime, limit);
            info!(limit, "session tx rate updated");
            true
        }
        addr if addr == OFF_SESSION_RATE_CONTRACT => {
            let Some(limit) = decode_off_session_tx_rate(data) else {
                return false;
            };
            set_off_session_tx_rate(state, runtime, limit);
            info!(limit, "off-session tx rate updated");
            true
        }
        addr if addr == OFF_SESSION_MAX_CONTRACT => {
            let Some(amount) = decode_off_session_max_per_tx(data) else {
                return false;
            };
            set_off_session_max_per_tx(state, runtime, amount);
            info!(%amount, "off-session per-tx cap updated");
            true
        }
        addr if addr == SESSION_TZ_CONTRACT => {
            let Some(offset) = decode_session_tz_offset(data) else {
                return false;
            };
            set_session_tz_offset(state, runtime, i64::from(offset));
            info!(offset, "session timezone offset updated");
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::{get_tx_rate_epoch, get_tx_rate_usage, set_tx_rate_usage, TxRateUsage};
    use crate::MemoryState;
    use olivetum_types::olivo;

    #[test]
    fn test_block_period_round_trip() {
        let mut state = MemoryState::new();
        let runtime = RuntimeParams::new();
        assert_eq!(load_block_period(&state, &runtime), 15);

        set_block_period(&mut state, &runtime, 7);
        assert_eq!(runtime.block_period(), 7);

        // A fresh runtime picks the stored value back up.
        let fresh = RuntimeParams::new();
        assert_eq!(load_block_period(&state, &fresh), 7);
        assert_eq!(fresh.block_period(), 7);
    }

    #[test]
    fn test_rate_limit_set_bumps_epoch() {
        let mut state = MemoryState::new();
        let runtime = RuntimeParams::new();
        let addr = Address::repeat_byte(1);
        set_tx_rate_usage(
            &mut state,
            addr,
            TxRateUsage {
                count: 5,
                start: 1_000,
                epoch: get_tx_rate_epoch(&state),
            },
        );

        let epoch_before = get_tx_rate_epoch(&state);
        set_tx_rate_limit(&mut state, &runtime, 9);
        assert_eq!(runtime.tx_rate_limit(), 9);
        assert_eq!(get_tx_rate_epoch(&state), epoch_before + 1);
        // Stored counters are stale now.
        assert_ne!(get_tx_rate_usage(&state, addr).epoch, get_tx_rate_epoch(&state));
    }

    #[test]
    fn test_apply_management_payload_decodes() {
        let mut state = MemoryState::new();
        let runtime = RuntimeParams::new();

        assert!(apply_management_payload(
            &mut state,
            &runtime,
            BURN_CONTRACT,
            &[3]
        ));
        assert_eq!(crate::burn::get_burn_rate(&state), 200);

        let mut amount = [0u8; 8];
        amount[6..].copy_from_slice(&5_000u16.to_be_bytes());
        assert!(apply_management_payload(
            &mut state,
            &runtime,
            MIN_TX_AMOUNT_CONTRACT,
            &amount
        ));
        assert_eq!(runtime.min_tx_amount(), olivo(5));

        // Out-of-bounds payloads are refused.
        assert!(!apply_management_payload(
            &mut state,
            &runtime,
            PERIOD_CONTRACT,
            &[0]
        ));
        assert!(!apply_management_payload(
            &mut state,
            &runtime,
            Address::repeat_byte(9),
            &[1]
        ));
    }

    #[test]
    fn test_session_tz_round_trip_negative() {
        let mut state = MemoryState::new();
        let runtime = RuntimeParams::new();
        set_session_tz_offset(&mut state, &runtime, -7_200);
        let fresh = RuntimeParams::new();
        assert_eq!(load_session_tz_offset(&state, &fresh), -7_200);
    }
}
