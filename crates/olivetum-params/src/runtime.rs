//! The process-wide runtime parameter store.
//!
//! Readers get values by copy; writers are expected to be serialized by the
//! state-transition apply path. Scalar knobs are atomics, big-integer knobs
//! and the fork schedule sit behind `parking_lot` locks.

use crate::{
    min_tx_amount_default, off_session_max_per_tx_max, DEFAULT_BLOCK_PERIOD, GENESIS_GAS_LIMIT,
    OFF_SESSION_TX_RATE_DEFAULT, TX_RATE_LIMIT_DEFAULT,
};
use olivetum_types::U256;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Fork activation heights. `None` disables the fork entirely; `Some(0)`
/// activates it from genesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForkSchedule {
    /// Post-fork difficulty rules (clamps + gap drop).
    pub difficulty: Option<u64>,
    /// Live (ceil-based) gap drop for stuck chains.
    pub live_drop: Option<u64>,
    /// ETC-style difficulty with quantized gap drop.
    pub etc: Option<u64>,
    /// ETC-style difficulty with the milder step drop.
    pub etc_step: Option<u64>,
    /// Transaction economy rules (payload shapes, burns, budgets).
    pub economy: Option<u64>,
    /// Redirect a share of each burn to the miner.
    pub burn_share: Option<u64>,
    /// Start of the reward halving schedule.
    pub reward: u64,
}

impl Default for ForkSchedule {
    fn default() -> Self {
        Self {
            difficulty: Some(57_900),
            live_drop: None,
            etc: Some(61_500),
            etc_step: Some(76_000),
            economy: Some(260_000),
            burn_share: Some(0),
            reward: 0,
        }
    }
}

fn at_or_after(fork: Option<u64>, number: u64) -> bool {
    match fork {
        Some(height) => number >= height,
        None => false,
    }
}

/// Tunables for the difficulty controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyTunables {
    /// Post-fork clamp: max increase is `parent * inc_num / inc_den`.
    pub inc_num: u64,
    pub inc_den: u64,
    /// Post-fork clamp: max decrease is `parent / dec_div`.
    pub dec_div: u64,
    /// Minimum timestamp increment as a fraction of the target period.
    pub min_timestamp_num: u64,
    pub min_timestamp_den: u64,
    /// Emergency gap drop threshold and divisor cap.
    pub gap_drop_seconds: u64,
    pub gap_drop_max_divisor: u64,
    /// Step drop: first drop after `step_start_seconds`, another
    /// `step_drop_bps` every `step_interval_seconds`, capped per block.
    pub step_start_seconds: u64,
    pub step_interval_seconds: u64,
    pub step_drop_bps: u64,
    pub step_max_drop_bps: u64,
}

impl Default for DifficultyTunables {
    fn default() -> Self {
        Self {
            inc_num: 3,
            inc_den: 2,
            dec_div: 4096,
            min_timestamp_num: 1,
            min_timestamp_den: 6,
            gap_drop_seconds: 60,
            gap_drop_max_divisor: 65_536,
            step_start_seconds: 120,
            step_interval_seconds: 60,
            step_drop_bps: 200,
            step_max_drop_bps: 5_000,
        }
    }
}

/// Process-wide mirror of the on-chain configurable knobs.
pub struct RuntimeParams {
    block_period: AtomicU64,
    gas_limit: AtomicU64,
    tx_rate_limit: AtomicU64,
    off_session_tx_rate: AtomicU64,
    session_tz_offset: AtomicI64,
    dividend_rate: AtomicU64,
    min_tx_amount: RwLock<U256>,
    off_session_max_per_tx: RwLock<U256>,
    forks: RwLock<ForkSchedule>,
    difficulty: RwLock<DifficultyTunables>,
}

impl Default for RuntimeParams {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeParams {
    pub fn new() -> Self {
        Self {
            block_period: AtomicU64::new(DEFAULT_BLOCK_PERIOD),
            gas_limit: AtomicU64::new(GENESIS_GAS_LIMIT),
            tx_rate_limit: AtomicU64::new(TX_RATE_LIMIT_DEFAULT),
            off_session_tx_rate: AtomicU64::new(OFF_SESSION_TX_RATE_DEFAULT),
            session_tz_offset: AtomicI64::new(0),
            dividend_rate: AtomicU64::new(50),
            min_tx_amount: RwLock::new(min_tx_amount_default()),
            off_session_max_per_tx: RwLock::new(off_session_max_per_tx_max()),
            forks: RwLock::new(ForkSchedule::default()),
            difficulty: RwLock::new(DifficultyTunables::default()),
        }
    }

    pub fn block_period(&self) -> u64 {
        self.block_period.load(Ordering::Relaxed)
    }

    pub fn set_block_period(&self, period: u64) {
        self.block_period.store(period, Ordering::Relaxed);
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit.load(Ordering::Relaxed)
    }

    pub fn set_gas_limit(&self, limit: u64) {
        self.gas_limit.store(limit, Ordering::Relaxed);
    }

    pub fn tx_rate_limit(&self) -> u64 {
        self.tx_rate_limit.load(Ordering::Relaxed)
    }

    pub fn set_tx_rate_limit(&self, limit: u64) {
        self.tx_rate_limit.store(limit, Ordering::Relaxed);
    }

    pub fn off_session_tx_rate(&self) -> u64 {
        self.off_session_tx_rate.load(Ordering::Relaxed)
    }

    pub fn set_off_session_tx_rate(&self, limit: u64) {
        self.off_session_tx_rate.store(limit, Ordering::Relaxed);
    }

    pub fn session_tz_offset(&self) -> i64 {
        self.session_tz_offset.load(Ordering::Relaxed)
    }

    pub fn set_session_tz_offset(&self, offset: i64) {
        self.session_tz_offset.store(offset, Ordering::Relaxed);
    }

    pub fn dividend_rate(&self) -> u64 {
        self.dividend_rate.load(Ordering::Relaxed)
    }

    pub fn set_dividend_rate(&self, rate: u64) {
        self.dividend_rate.store(rate, Ordering::Relaxed);
    }

    pub fn min_tx_amount(&self) -> U256 {
        *self.min_tx_amount.read()
    }

    pub fn set_min_tx_amount(&self, amount: U256) {
        *self.min_tx_amount.write() = amount;
    }

    pub fn off_session_max_per_tx(&self) -> U256 {
        *self.off_session_max_per_tx.read()
    }

    pub fn set_off_session_max_per_tx(&self, amount: U256) {
        *self.off_session_max_per_tx.write() = amount;
    }

    pub fn forks(&self) -> ForkSchedule {
        *self.forks.read()
    }

    pub fn set_forks(&self, forks: ForkSchedule) {
        *self.forks.write() = forks;
    }

    pub fn difficulty_tunables(&self) -> DifficultyTunables {
        *self.difficulty.read()
    }

    pub fn set_difficulty_tunables(&self, tunables: DifficultyTunables) {
        *self.difficulty.write() = tunables;
    }

    pub fn is_after_difficulty_fork(&self, number: u64) -> bool {
        at_or_after(self.forks.read().difficulty, number)
    }

    pub fn is_after_live_drop_fork(&self, number: u64) -> bool {
        at_or_after(self.forks.read().live_drop, number)
    }

    pub fn is_after_etc_fork(&self, number: u64) -> bool {
        at_or_after(self.forks.read().etc, number)
    }

    pub fn is_after_etc_step_fork(&self, number: u64) -> bool {
        at_or_after(self.forks.read().etc_step, number)
    }

    pub fn is_economy_fork_active(&self, number: u64) -> bool {
        at_or_after(self.forks.read().economy, number)
    }

    pub fn is_burn_share_fork_active(&self, number: u64) -> bool {
        at_or_after(self.forks.read().burn_share, number)
    }

    pub fn reward_fork_block(&self) -> u64 {
        self.forks.read().reward
    }

    /// Capture every knob so tests can restore the store on exit.
    pub fn snapshot(&self) -> RuntimeSnapshot {
        RuntimeSnapshot {
            block_period: self.block_period(),
            gas_limit: self.gas_limit(),
            tx_rate_limit: self.tx_rate_limit(),
            off_session_tx_rate: self.off_session_tx_rate(),
            session_tz_offset: self.session_tz_offset(),
            dividend_rate: self.dividend_rate(),
            min_tx_amount: self.min_tx_amount(),
            off_session_max_per_tx: self.off_session_max_per_tx(),
            forks: self.forks(),
            difficulty: self.difficulty_tunables(),
        }
    }

    pub fn restore(&self, snapshot: &RuntimeSnapshot) {
        self.set_block_period(snapshot.block_period);
        self.set_gas_limit(snapshot.gas_limit);
        self.set_tx_rate_limit(snapshot.tx_rate_limit);
        self.set_off_session_tx_rate(snapshot.off_session_tx_rate);
        self.set_session_tz_offset(snapshot.session_tz_offset);
        self.set_dividend_rate(snapshot.dividend_rate);
        self.set_min_tx_amount(snapshot.min_tx_amount);
        self.set_off_session_max_per_tx(snapshot.off_session_max_per_tx);
        self.set_forks(snapshot.forks);
        self.set_difficulty_tunables(snapshot.difficulty);
    }
}

/// A point-in-time copy of every runtime knob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSnapshot {
    pub block_period: u64,
    pub gas_limit: u64,
    pub tx_rate_limit: u64,
    pub off_session_tx_rate: u64,
    pub session_tz_offset: i64,
    pub dividend_rate: u64,
    pub min_tx_amount: U256,
    pub off_session_max_per_tx: U256,
    pub forks: ForkSchedule,
    pub difficulty: DifficultyTunables,
}

#[cfg(test)]
mod tests {
    use super::*;
    use olivetum_types::olivo;

    #[test]
    fn test_defaults() {
        let params = RuntimeParams::new();
        assert_eq!(params.block_period(), 15);
        assert_eq!(params.tx_rate_limit(), 5);
        assert_eq!(params.off_session_tx_rate(), 2);
        assert_eq!(params.session_tz_offset(), 0);
        assert_eq!(params.min_tx_amount(), olivo(10));
        assert_eq!(params.off_session_max_per_tx(), olivo(10_000));
    }

    #[test]
    fn test_fork_gates() {
        let params = RuntimeParams::new();
        assert!(!params.is_after_difficulty_fork(57_899));
        assert!(params.is_after_difficulty_fork(57_900));
        assert!(params.is_after_etc_fork(61_500));
        assert!(!params.is_after_etc_step_fork(75_999));
        assert!(params.is_after_etc_step_fork(76_000));
        // Live drop disabled by default.
        assert!(!params.is_after_live_drop_fork(u64::MAX));
        // Burn share active from genesis.
        assert!(params.is_burn_share_fork_active(0));
    }

    #[test]
    fn test_snapshot_restore() {
        let params = RuntimeParams::new();
        let before = params.snapshot();

        params.set_block_period(5);
        params.set_min_tx_amount(olivo(1));
        let mut forks = params.forks();
        forks.economy = Some(1);
        params.set_forks(forks);
        assert!(params.is_economy_fork_active(1));

        params.restore(&before);
        assert_eq!(params.block_period(), 15);
        assert_eq!(params.min_tx_amount(), olivo(10));
        assert!(!params.is_economy_fork_active(1));
    }
}
