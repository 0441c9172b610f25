//! HTTP handlers.

pub mod chain;
pub mod engine;

use crate::ApiError;
use olivetum_types::{Address, BlockNonce, H256};

pub(crate) fn parse_h256(input: &str) -> Result<H256, ApiError> {
    let cleaned = input.trim_start_matches("0x");
    let bytes = hex::decode(cleaned)
        .map_err(|_| ApiError::BadRequest(format!("invalid hex: {input}")))?;
    if bytes.len() != 32 {
        return Err(ApiError::BadRequest(format!(
            "expected 32 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(H256::from_slice(&bytes))
}

pub(crate) fn parse_address(input: &str) -> Result<Address, ApiError> {
    let cleaned = input.trim_start_matches("0x");
    let bytes = hex::decode(cleaned)
        .map_err(|_| ApiError::BadRequest(format!("invalid hex: {input}")))?;
    if bytes.len() != 20 {
        return Err(ApiError::BadRequest(format!(
            "expected 20 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(Address::from_slice(&bytes))
}

pub(crate) fn parse_nonce(input: &str) -> Result<BlockNonce, ApiError> {
    let cleaned = input.trim_start_matches("0x");
    let bytes = hex::decode(cleaned)
        .map_err(|_| ApiError::BadRequest(format!("invalid hex: {input}")))?;
    let bytes: [u8; 8] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| ApiError::BadRequest(format!("expected 8-byte nonce: {input}")))?;
    Ok(BlockNonce(bytes))
}
