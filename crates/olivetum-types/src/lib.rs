//! # olivetum-types
//!
//! Chain primitives shared across the Olivetum node crates.
//!
//! This crate provides:
//! - Fixed-width numerics and hashes (`U256`, `H256`, `Address`)
//! - Block headers with RLP encoding and Keccak hashing
//! - The minimal transaction shape consumed by the admission policy
//! - Event log entries emitted by the economy modules

mod header;
mod keccak;
mod log;
mod transaction;

pub use header::{Bloom, BlockHeader, BlockNonce, EMPTY_ROOT_HASH, EMPTY_UNCLE_HASH};
pub use keccak::{keccak256, keccak512};
pub use log::LogEntry;
pub use transaction::{AccessListItem, Transaction};

pub use primitive_types::{H160 as Address, H256, U256, U512};

/// One Olivo in wei (10^18).
pub fn olivo(amount: u64) -> U256 {
    U256::from(amount) * U256::exp10(18)
}

/// One wei-denominated fraction of an Olivo: `numerator * 10^18 / denominator`.
pub fn olivo_frac(numerator: u64, denominator: u64) -> U256 {
    U256::from(numerator) * U256::exp10(18) / U256::from(denominator)
}
