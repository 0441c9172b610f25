//! Burn-rate slot and burn arithmetic.

use crate::slots::{h256_from_u64, u64_from_h256};
use crate::statedb::{ensure_account, StateDB};
use olivetum_params::BURN_CONTRACT;
use olivetum_types::{H256, U256};

/// Burn rate applied when the contract slot has never been written (bps).
pub const DEFAULT_BURN_RATE: u64 = 50;

/// Share of every burn redirected to the block miner (bps of the burn).
pub const MINER_BURN_SHARE_BPS: u64 = 25;

const BURN_DENOMINATOR: u64 = 10_000;

/// The configured burn rate in basis points, falling back to the default
/// when unset.
pub fn get_burn_rate(state: &dyn StateDB) -> u64 {
    let stored = u64_from_h256(state.get_state(BURN_CONTRACT, H256::zero()));
    if stored == 0 {
        DEFAULT_BURN_RATE
    } else {
        stored
    }
}

pub fn set_burn_rate(state: &mut dyn StateDB, rate: u64) {
    ensure_account(state, BURN_CONTRACT);
    state.set_state(BURN_CONTRACT, H256::zero(), h256_from_u64(rate));
}

/// `amount * rate / 10000`, capped at `amount`.
pub fn compute_burn(amount: U256, rate: u64) -> U256 {
    if amount.is_zero() || rate == 0 {
        return U256::zero();
    }
    let burn = amount * U256::from(rate) / U256::from(BURN_DENOMINATOR);
    burn.min(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryState;
    use olivetum_types::olivo;

    #[test]
    fn test_default_rate() {
        let state = MemoryState::new();
        assert_eq!(get_burn_rate(&state), DEFAULT_BURN_RATE);
    }

    #[test]
    fn test_set_rate() {
        let mut state = MemoryState::new();
        set_burn_rate(&mut state, 300);
        assert_eq!(get_burn_rate(&state), 300);
        assert_eq!(state.get_nonce(BURN_CONTRACT), 1);
    }

    #[test]
    fn test_compute_burn() {
        // 0.5% of 100 Olivo.
        assert_eq!(compute_burn(olivo(100), 50), olivo_half_percent());
        assert!(compute_burn(U256::zero(), 300).is_zero());
        assert!(compute_burn(olivo(1), 0).is_zero());
        // A rate above 10000 bps is capped at the full amount.
        assert_eq!(compute_burn(U256::from(10u64), 20_000), U256::from(10u64));
    }

    fn olivo_half_percent() -> U256 {
        olivo(100) * U256::from(50u64) / U256::from(10_000u64)
    }
}
