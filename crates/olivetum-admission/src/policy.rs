//! The admission checks, ordered most-specific first.

use crate::error::{AdmissionError, AdmissionResult};
use crate::payload::validate_payload;
use olivetum_params::{
    admin_for, is_management_contract, is_public_management_target, is_rate_limit_exempt,
    is_session, RuntimeParams, DIVIDEND_CONTRACT, MANAGEMENT_ADMIN,
};
use olivetum_state::{
    can_claim_dividend, can_trigger_dividend, off_session_budget_spent, tx_allowance, StateDB,
};
use olivetum_types::Transaction;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The block context a transaction is validated against.
#[derive(Debug, Clone, Copy)]
pub struct BlockEnv {
    /// Number of the block the transaction would land in.
    pub number: u64,
    /// That block's timestamp.
    pub time: u64,
    /// Wall-clock time, for dividend drift checks.
    pub wall_now: u64,
}

/// The transaction admission policy.
pub struct AdmissionPolicy {
    runtime: Arc<RuntimeParams>,
    allow_self_transfers: AtomicBool,
}

impl AdmissionPolicy {
    pub fn new(runtime: Arc<RuntimeParams>) -> Self {
        Self {
            runtime,
            allow_self_transfers: AtomicBool::new(false),
        }
    }

    pub fn runtime(&self) -> &Arc<RuntimeParams> {
        &self.runtime
    }

    /// Test override admitting self-transfers.
    pub fn set_allow_self_transfers(&self, allow: bool) {
        self.allow_self_transfers.store(allow, Ordering::Relaxed);
    }

    /// Validates a candidate transaction without consuming any budget.
    pub fn validate(
        &self,
        state: &dyn StateDB,
        tx: &Transaction,
        env: &BlockEnv,
    ) -> AdmissionResult<()> {
        let runtime = self.runtime.as_ref();
        let economy_active = runtime.is_economy_fork_active(env.number);

        // Contract creation is never admitted.
        let Some(to) = tx.to else {
            return Err(AdmissionError::CreationNotAllowed);
        };

        // Self transfers.
        if to == tx.from && !self.allow_self_transfers.load(Ordering::Relaxed) {
            return Err(AdmissionError::SelfTransfer);
        }

        // Management authorization.
        if !is_public_management_target(to) {
            if let Some(admin) = admin_for(to) {
                if tx.from != admin {
                    return Err(AdmissionError::UnauthorizedManagementTx);
                }
            }
        }

        // Payload shape.
        validate_payload(tx, economy_active)?;

        // Minimum amount for plain transfers. The administrator recipient is
        // only exempt before the economy fork.
        if !is_management_contract(to) {
            let exempt = !economy_active && to == MANAGEMENT_ADMIN;
            if !exempt && tx.value < runtime.min_tx_amount() {
                return Err(AdmissionError::UnderMinAmount);
            }
        }

        // Rate limit. Administrator management transactions never consume a
        // slot, and the administrator is not limited at all before the fork.
        let rate_exempt = is_rate_limit_exempt(tx.from, to, &tx.data)
            || (!economy_active && tx.from == MANAGEMENT_ADMIN);
        if !rate_exempt && tx_allowance(state, runtime, tx.from, env.time) == 0 {
            return Err(AdmissionError::RateLimit);
        }

        // Off-session caps.
        let in_session = is_session(env.time, runtime.session_tz_offset());
        if !in_session && !tx.value.is_zero() {
            let cap = runtime.off_session_max_per_tx();
            if !cap.is_zero() && tx.value > cap {
                return Err(AdmissionError::OverMaxOffSession);
            }
            if economy_active {
                let spent = off_session_budget_spent(state, runtime, tx.from, env.time);
                if !cap.is_zero() && spent.saturating_add(tx.value) > cap {
                    return Err(AdmissionError::OverOffSessionBudget);
                }
            }
        }

        // Dividend eligibility.
        if to == DIVIDEND_CONTRACT {
            if tx.data.is_empty() {
                if !can_claim_dividend(state, tx.from, env.time, env.wall_now) {
                    return Err(AdmissionError::DividendNotEligible);
                }
            } else if !can_trigger_dividend(state, env.time, env.wall_now) {
                return Err(AdmissionError::DividendRoundTooSoon);
            }
        }

        Ok(())
    }
}

/// Validates a transaction under a default policy instance.
pub fn validate_transaction(
    runtime: &Arc<RuntimeParams>,
    state: &dyn StateDB,
    tx: &Transaction,
    env: &BlockEnv,
) -> AdmissionResult<()> {
    AdmissionPolicy::new(Arc::clone(runtime)).validate(state, tx, env)
}
