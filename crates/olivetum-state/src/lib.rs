//! # olivetum-state
//!
//! Ledger-slot bindings for the Olivetum economy.
//!
//! This crate provides:
//! - The `StateDB` trait the engine reads and writes through, plus an
//!   in-memory implementation used by tests
//! - Supply counters (minted, burned, dividends, miner burn share)
//! - The burn-rate slot and burn arithmetic
//! - The dividend module: rounds, claims, holding queues
//! - Per-address off-session budgets and tx-rate usage
//! - Loaders that mirror on-chain configuration into the runtime store
//! - Per-transaction economy effects (transfer and gas-fee burn splits)
//!
//! The host chain's state database is external; everything here goes
//! through `StateDB` so the real ledger can be plugged in at the edge.

mod budget;
mod burn;
mod config;
mod dividend;
mod economy;
mod rate_limit;
mod slots;
mod statedb;
mod supply;

pub use budget::{off_session_budget_spent, update_off_session_budget, OverOffSessionBudget};
pub use burn::{compute_burn, get_burn_rate, set_burn_rate, DEFAULT_BURN_RATE, MINER_BURN_SHARE_BPS};
pub use config::{
    apply_management_payload, load_block_period, load_gas_limit, load_min_tx_amount,
    load_off_session_max_per_tx, load_off_session_tx_rate, load_session_tz_offset,
    load_tx_rate_limit, set_block_period, set_gas_limit, set_min_tx_amount,
    set_off_session_max_per_tx, set_off_session_tx_rate, set_session_tz_offset,
    set_tx_rate_limit,
};
pub use dividend::{
    add_holding, can_claim_dividend, can_trigger_dividend, claim_dividend, dividend_rate,
    dividend_status, dividend_view, get_held_amount, get_holding_time, get_round_id,
    get_round_rate, get_round_start, remove_holding, trigger_dividend, DividendStatus,
    DividendView, CLAIM_WINDOW_SECONDS, DIVIDEND_CLAIMED_TOPIC, DIVIDEND_INTERVAL_SECONDS,
    HOLDING_QUALIFY_SECONDS, MAX_TIMESTAMP_DRIFT_SECONDS,
};
pub use economy::{
    apply_economy_baseline, apply_gas_fee, apply_value_transfer, mint_dividend_claim_tip,
};
pub use rate_limit::{
    clear_tx_rate_usage, get_tx_rate_epoch, get_tx_rate_usage, reset_tx_rate_usage,
    set_tx_rate_usage, tx_allowance, TxRateUsage,
};
pub use statedb::{MemoryState, StateDB};
pub use supply::{
    add_total_burned, add_total_burned_gas, add_total_burned_transfers,
    add_total_dividends_minted, add_total_miner_burn_share, get_total_burned,
    get_total_burned_gas, get_total_burned_transfers, get_total_dividends_minted,
    get_total_minted, get_total_miner_burn_share, set_total_minted,
};
