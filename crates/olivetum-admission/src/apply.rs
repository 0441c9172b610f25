//! The apply path: consuming budgets and executing the effects of an
//! admitted transaction as part of the state transition.

use crate::error::{AdmissionError, AdmissionResult};
use crate::policy::{AdmissionPolicy, BlockEnv};
use olivetum_params::{
    admin_for, decode_dividend_rate, is_management_contract, is_rate_limit_exempt, is_session,
    DIVIDEND_CONTRACT, MANAGEMENT_ADMIN,
};
use olivetum_state::{
    apply_gas_fee, apply_management_payload, apply_value_transfer, claim_dividend,
    get_tx_rate_epoch, get_tx_rate_usage, mint_dividend_claim_tip, set_tx_rate_usage,
    trigger_dividend, update_off_session_budget, StateDB, TxRateUsage,
};
use olivetum_types::{Address, Transaction, U256};
use tracing::debug;

const RATE_WINDOW_SECONDS: u64 = 60 * 60;

fn consume_rate_slot(state: &mut dyn StateDB, from: Address, now: u64) {
    let epoch = get_tx_rate_epoch(state);
    let usage = get_tx_rate_usage(state, from);
    let next = if usage.epoch != epoch || now.saturating_sub(usage.start) >= RATE_WINDOW_SECONDS {
        TxRateUsage {
            count: 1,
            start: now,
            epoch,
        }
    } else {
        TxRateUsage {
            count: usage.count + 1,
            ..usage
        }
    };
    set_tx_rate_usage(state, from, next);
}

/// Validates and applies a transaction: consumes the sender's rate slot and
/// off-session budget, then executes the management, dividend or transfer
/// effect. The gas fee is routed through the burn split. Either the whole
/// effect lands or none of it does.
pub fn apply_transaction(
    policy: &AdmissionPolicy,
    state: &mut dyn StateDB,
    tx: &Transaction,
    env: &BlockEnv,
    coinbase: Address,
    gas_used: u64,
) -> AdmissionResult<()> {
    policy.validate(state, tx, env)?;

    let runtime = policy.runtime().as_ref();
    let economy_active = runtime.is_economy_fork_active(env.number);
    let in_session = is_session(env.time, runtime.session_tz_offset());

    // Rate accounting mirrors the validation-side exemptions.
    let rate_exempt = tx
        .to
        .map(|to| is_rate_limit_exempt(tx.from, to, &tx.data))
        .unwrap_or(false)
        || (!economy_active && tx.from == MANAGEMENT_ADMIN);
    if !rate_exempt {
        consume_rate_slot(state, tx.from, env.time);
    }

    if economy_active && !in_session && !tx.value.is_zero() {
        update_off_session_budget(state, runtime, tx.from, tx.value, env.time)
            .map_err(|_| AdmissionError::OverOffSessionBudget)?;
    }

    let to = tx.to.ok_or(AdmissionError::CreationNotAllowed)?;

    if to == DIVIDEND_CONTRACT {
        if tx.data.is_empty() {
            let reward = claim_dividend(state, tx.from, env.time, env.wall_now);
            if reward.is_zero() {
                return Err(AdmissionError::DividendNotEligible);
            }
            let tip = mint_dividend_claim_tip(state, reward, coinbase, env.time);
            debug!(claimant = %tx.from, %reward, %tip, "dividend claim applied");
        } else {
            let rate = decode_dividend_rate(&tx.data).ok_or(AdmissionError::DataLengthInvalid)?;
            runtime.set_dividend_rate(rate);
            if !trigger_dividend(state, rate, env.time, env.wall_now) {
                return Err(AdmissionError::DividendRoundTooSoon);
            }
        }
    } else if is_management_contract(to) {
        debug_assert_eq!(admin_for(to), Some(MANAGEMENT_ADMIN));
        if !apply_management_payload(state, runtime, to, &tx.data) {
            return Err(AdmissionError::DataLengthInvalid);
        }
    } else if !tx.value.is_zero() {
        apply_value_transfer(
            state, runtime, tx.from, to, tx.value, coinbase, env.number, env.time,
        );
    }

    if gas_used > 0 && !tx.gas_price.is_zero() {
        let fee = U256::from(gas_used) * tx.gas_price;
        state.sub_balance(tx.from, fee);
        apply_gas_fee(state, runtime, fee, coinbase, env.number, env.time);
    }

    Ok(())
}
