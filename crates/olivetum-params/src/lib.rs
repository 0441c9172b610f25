//! # olivetum-params
//!
//! Runtime-configurable parameters and the management contract table for the
//! Olivetum network.
//!
//! This crate provides:
//! - `RuntimeParams`, the process-wide mirror of on-chain tunables
//! - The fork schedule and difficulty-controller tunables
//! - Reserved management contract addresses and payload decoders
//! - Session-calendar math (market hours, off-session budget windows)
//!
//! A single `RuntimeParams` value is owned by the engine and shared via
//! `Arc`; writes are confined to the state-transition apply path, so
//! readers never need coordination beyond atomic loads.

mod management;
mod runtime;
mod session;

pub use management::{
    admin_for, decode_block_period, decode_burn_rate, decode_dividend_rate, decode_gas_limit,
    decode_min_tx_amount, decode_off_session_max_per_tx, decode_off_session_tx_rate,
    decode_session_tz_offset, decode_tx_rate_limit, is_management_contract,
    is_public_management_target, is_rate_limit_exempt, BURN_CONTRACT, DIVIDEND_CONTRACT,
    GAS_LIMIT_CONTRACT, MANAGEMENT_ADMIN, MIN_TX_AMOUNT_CONTRACT, OFF_SESSION_MAX_CONTRACT,
    OFF_SESSION_RATE_CONTRACT, PERIOD_CONTRACT, REWARD_VAULT, SESSION_TZ_CONTRACT,
    TX_RATE_CONTRACT,
};
pub use runtime::{DifficultyTunables, ForkSchedule, RuntimeParams, RuntimeSnapshot};
pub use session::{is_session, off_session_window_start};

use olivetum_types::{olivo, olivo_frac, U256};

/// Target block period in seconds when nothing else is configured.
pub const DEFAULT_BLOCK_PERIOD: u64 = 15;

/// Genesis gas limit, used until a management transaction overrides it.
pub const GENESIS_GAS_LIMIT: u64 = 4_712_388;

/// Default session-window transaction rate (tx/h).
pub const TX_RATE_LIMIT_DEFAULT: u64 = 5;
/// Transaction rate bounds for both session and off-session limits.
pub const TX_RATE_LIMIT_MIN: u64 = 1;
pub const TX_RATE_LIMIT_MAX: u64 = 100;

/// Default off-session transaction rate (tx/h).
pub const OFF_SESSION_TX_RATE_DEFAULT: u64 = 2;

/// Per-block reward at the start of the schedule: 12 Olivo.
pub fn reward_base() -> U256 {
    olivo(12)
}

/// Reward floor after halvings: 0.375 Olivo.
pub fn reward_floor() -> U256 {
    olivo_frac(375, 1000)
}

/// Hard supply cap: 500 million Olivo.
pub fn max_supply() -> U256 {
    olivo(500_000_000)
}

/// Blocks between reward halvings (~4 years at 15 s).
pub const REWARD_HALVING_INTERVAL: u64 = 8_409_600;

/// Default minimum transaction amount: 10 Olivo.
pub fn min_tx_amount_default() -> U256 {
    olivo(10)
}

/// Minimum configurable min-tx amount: 0.001 Olivo (also the decode unit).
pub fn min_tx_amount_min() -> U256 {
    olivo_frac(1, 1000)
}

/// Maximum configurable min-tx amount: 100 Olivo.
pub fn min_tx_amount_max() -> U256 {
    olivo(100)
}

/// Minimum off-session per-transaction cap: 0.0001 Olivo (decode unit).
pub fn off_session_max_per_tx_min() -> U256 {
    olivo_frac(1, 10_000)
}

/// Maximum (and default) off-session per-transaction cap: 10000 Olivo.
pub fn off_session_max_per_tx_max() -> U256 {
    olivo(10_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_constants() {
        assert_eq!(reward_base(), U256::from(12u64) * U256::exp10(18));
        assert_eq!(reward_floor(), U256::from(375u64) * U256::exp10(15));
        assert_eq!(max_supply(), U256::from(500_000_000u64) * U256::exp10(18));
    }

    #[test]
    fn test_amount_bounds_ordering() {
        assert!(min_tx_amount_min() < min_tx_amount_default());
        assert!(min_tx_amount_default() < min_tx_amount_max());
        assert!(off_session_max_per_tx_min() < off_session_max_per_tx_max());
    }
}
