//! Storage-slot layout helpers.
//!
//! Slot keys follow the original layout: a tag byte at position 0, the
//! subject address at bytes 12..32, and for queue entries a big-endian
//! index overwriting bytes 24..32.

use olivetum_types::{keccak256, Address, H256, U256};

/// A slot whose first byte is a tag and the rest zero.
pub(crate) fn tagged_slot(tag: u8) -> H256 {
    let mut bytes = [0u8; 32];
    bytes[0] = tag;
    H256(bytes)
}

/// A tag byte plus the address at bytes 12..32.
pub(crate) fn tagged_addr_slot(tag: u8, address: Address) -> H256 {
    let mut bytes = [0u8; 32];
    bytes[0] = tag;
    bytes[12..32].copy_from_slice(address.as_bytes());
    H256(bytes)
}

/// A tagged address slot with a big-endian index overwriting bytes 24..32.
pub(crate) fn tagged_addr_index_slot(tag: u8, address: Address, index: u64) -> H256 {
    let mut bytes = [0u8; 32];
    bytes[0] = tag;
    bytes[12..32].copy_from_slice(address.as_bytes());
    bytes[24..32].copy_from_slice(&index.to_be_bytes());
    H256(bytes)
}

/// Per-address tx-rate slots: keccak over a 64-byte buffer with the address
/// at bytes 12..32 and a field index in the final byte.
pub(crate) fn tx_rate_slot(address: Address, field: u8) -> H256 {
    let mut buf = [0u8; 64];
    buf[12..32].copy_from_slice(address.as_bytes());
    buf[63] = field;
    keccak256(&[&buf])
}

pub(crate) fn h256_from_u64(value: u64) -> H256 {
    let mut bytes = [0u8; 32];
    bytes[24..32].copy_from_slice(&value.to_be_bytes());
    H256(bytes)
}

pub(crate) fn u64_from_h256(value: H256) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&value.as_bytes()[24..32]);
    u64::from_be_bytes(bytes)
}

pub(crate) fn h256_from_u256(value: U256) -> H256 {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    H256(bytes)
}

pub(crate) fn u256_from_h256(value: H256) -> U256 {
    U256::from_big_endian(value.as_bytes())
}
