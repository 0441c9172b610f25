//! Supply counters tracked under the reward vault account.

use crate::slots::{h256_from_u256, tagged_slot, u256_from_h256};
use crate::statedb::{ensure_account, StateDB};
use olivetum_params::REWARD_VAULT;
use olivetum_types::U256;

const TOTAL_MINTED_SLOT: u8 = 0x0c;
const TOTAL_BURNED_SLOT: u8 = 0x0d;
const TOTAL_DIVIDENDS_MINTED_SLOT: u8 = 0x0e;
const TOTAL_BURNED_TRANSFERS_SLOT: u8 = 0x0f;
const TOTAL_BURNED_GAS_SLOT: u8 = 0x10;
const TOTAL_MINER_BURN_SHARE_SLOT: u8 = 0x11;

fn read_total(state: &dyn StateDB, tag: u8) -> U256 {
    u256_from_h256(state.get_state(REWARD_VAULT, tagged_slot(tag)))
}

fn write_total(state: &mut dyn StateDB, tag: u8, amount: U256) {
    ensure_account(state, REWARD_VAULT);
    state.set_state(REWARD_VAULT, tagged_slot(tag), h256_from_u256(amount));
}

fn add_total(state: &mut dyn StateDB, tag: u8, amount: U256) {
    if amount.is_zero() {
        return;
    }
    let total = read_total(state, tag);
    write_total(state, tag, total.saturating_add(amount));
}

pub fn get_total_minted(state: &dyn StateDB) -> U256 {
    read_total(state, TOTAL_MINTED_SLOT)
}

pub fn set_total_minted(state: &mut dyn StateDB, amount: U256) {
    write_total(state, TOTAL_MINTED_SLOT, amount);
}

pub fn get_total_burned(state: &dyn StateDB) -> U256 {
    read_total(state, TOTAL_BURNED_SLOT)
}

pub fn add_total_burned(state: &mut dyn StateDB, amount: U256) {
    add_total(state, TOTAL_BURNED_SLOT, amount);
}

pub fn get_total_burned_transfers(state: &dyn StateDB) -> U256 {
    read_total(state, TOTAL_BURNED_TRANSFERS_SLOT)
}

pub fn add_total_burned_transfers(state: &mut dyn StateDB, amount: U256) {
    add_total(state, TOTAL_BURNED_TRANSFERS_SLOT, amount);
}

pub fn get_total_burned_gas(state: &dyn StateDB) -> U256 {
    read_total(state, TOTAL_BURNED_GAS_SLOT)
}

pub fn add_total_burned_gas(state: &mut dyn StateDB, amount: U256) {
    add_total(state, TOTAL_BURNED_GAS_SLOT, amount);
}

pub fn get_total_miner_burn_share(state: &dyn StateDB) -> U256 {
    read_total(state, TOTAL_MINER_BURN_SHARE_SLOT)
}

pub fn add_total_miner_burn_share(state: &mut dyn StateDB, amount: U256) {
    add_total(state, TOTAL_MINER_BURN_SHARE_SLOT, amount);
}

pub fn get_total_dividends_minted(state: &dyn StateDB) -> U256 {
    read_total(state, TOTAL_DIVIDENDS_MINTED_SLOT)
}

pub fn add_total_dividends_minted(state: &mut dyn StateDB, amount: U256) {
    add_total(state, TOTAL_DIVIDENDS_MINTED_SLOT, amount);
}
