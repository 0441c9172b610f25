//! The state database interface and an in-memory implementation.

use olivetum_types::{Address, LogEntry, H256, U256};
use std::collections::HashMap;

/// The slice of the host state database the Olivetum modules touch.
///
/// The real ledger is owned by the host chain; this trait is the narrow
/// seam the engine, admission policy and economy modules write through.
pub trait StateDB {
    fn get_state(&self, address: Address, slot: H256) -> H256;
    fn set_state(&mut self, address: Address, slot: H256, value: H256);

    fn get_balance(&self, address: Address) -> U256;
    fn add_balance(&mut self, address: Address, amount: U256);
    fn sub_balance(&mut self, address: Address, amount: U256);

    fn get_nonce(&self, address: Address) -> u64;
    fn set_nonce(&mut self, address: Address, nonce: u64);

    fn add_log(&mut self, log: LogEntry);
}

/// Marks a system account as existing so state commits retain its storage.
pub(crate) fn ensure_account(state: &mut dyn StateDB, address: Address) {
    if state.get_nonce(address) == 0 {
        state.set_nonce(address, 1);
    }
}

/// A hash-map backed `StateDB` for tests and tooling.
#[derive(Debug, Default, Clone)]
pub struct MemoryState {
    storage: HashMap<(Address, H256), H256>,
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    logs: Vec<LogEntry>,
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }
}

impl StateDB for MemoryState {
    fn get_state(&self, address: Address, slot: H256) -> H256 {
        self.storage
            .get(&(address, slot))
            .copied()
            .unwrap_or_default()
    }

    fn set_state(&mut self, address: Address, slot: H256, value: H256) {
        if value == H256::zero() {
            self.storage.remove(&(address, slot));
        } else {
            self.storage.insert((address, slot), value);
        }
    }

    fn get_balance(&self, address: Address) -> U256 {
        self.balances.get(&address).copied().unwrap_or_default()
    }

    fn add_balance(&mut self, address: Address, amount: U256) {
        let entry = self.balances.entry(address).or_default();
        *entry = entry.saturating_add(amount);
    }

    fn sub_balance(&mut self, address: Address, amount: U256) {
        let entry = self.balances.entry(address).or_default();
        *entry = entry.saturating_sub(amount);
    }

    fn get_nonce(&self, address: Address) -> u64 {
        self.nonces.get(&address).copied().unwrap_or_default()
    }

    fn set_nonce(&mut self, address: Address, nonce: u64) {
        self.nonces.insert(address, nonce);
    }

    fn add_log(&mut self, log: LogEntry) {
        self.logs.push(log);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_round_trip() {
        let mut state = MemoryState::new();
        let addr = Address::repeat_byte(1);
        let slot = H256::repeat_byte(2);
        assert_eq!(state.get_state(addr, slot), H256::zero());

        let value = H256::repeat_byte(3);
        state.set_state(addr, slot, value);
        assert_eq!(state.get_state(addr, slot), value);

        state.set_state(addr, slot, H256::zero());
        assert_eq!(state.get_state(addr, slot), H256::zero());
    }

    #[test]
    fn test_balance_saturation() {
        let mut state = MemoryState::new();
        let addr = Address::repeat_byte(1);
        state.sub_balance(addr, U256::from(5u64));
        assert_eq!(state.get_balance(addr), U256::zero());
        state.add_balance(addr, U256::from(10u64));
        state.sub_balance(addr, U256::from(4u64));
        assert_eq!(state.get_balance(addr), U256::from(6u64));
    }
}
