//! Reserved management addresses and payload decoders.
//!
//! Every management contract is a fixed 20-byte address whose storage holds a
//! single tunable. Payloads are fixed-width: one byte for rates and the
//! period, eight bytes for amounts, four bytes for the timezone offset.
//! Decoders return `None` on any length or bounds violation.

use crate::{
    min_tx_amount_max, min_tx_amount_min, off_session_max_per_tx_max, off_session_max_per_tx_min,
    TX_RATE_LIMIT_MAX, TX_RATE_LIMIT_MIN,
};
use olivetum_types::{Address, U256};
use primitive_types::H160;

const fn reserved(tag: u16) -> Address {
    let mut bytes = [0u8; 20];
    bytes[18] = (tag >> 8) as u8;
    bytes[19] = (tag & 0xff) as u8;
    H160(bytes)
}

/// The network administrator authorized for all management contracts.
pub const MANAGEMENT_ADMIN: Address = H160([
    0x17, 0xa9, 0x6a, 0xb6, 0x6c, 0x97, 0x1e, 0x72, 0xbb, 0x1f, 0x9d, 0x35, 0x57, 0x92, 0xec,
    0xea, 0xea, 0xf5, 0x9a, 0xf5,
]);

/// Account whose storage tracks minted/burned supply totals.
pub const REWARD_VAULT: Address = H160([
    0xa0, 0x8b, 0x77, 0x22, 0xe5, 0x8d, 0xfa, 0xb0, 0x26, 0xc8, 0xfa, 0xfc, 0xfb, 0x1f, 0x82,
    0x64, 0x67, 0xf5, 0x7c, 0xb6,
]);

pub const BURN_CONTRACT: Address = reserved(0x0b00);
pub const GAS_LIMIT_CONTRACT: Address = reserved(0x0b01);
pub const PERIOD_CONTRACT: Address = reserved(0x0b02);
pub const MIN_TX_AMOUNT_CONTRACT: Address = reserved(0x0b03);
pub const TX_RATE_CONTRACT: Address = reserved(0x0b04);
pub const OFF_SESSION_RATE_CONTRACT: Address = reserved(0x0b05);
pub const OFF_SESSION_MAX_CONTRACT: Address = reserved(0x0b06);
pub const SESSION_TZ_CONTRACT: Address = reserved(0x0b07);
pub const DIVIDEND_CONTRACT: Address = reserved(0xd1e1);

/// Selectable burn rates in basis points of 10000.
pub const BURN_RATE_OPTIONS: [u64; 6] = [50, 100, 150, 200, 250, 300];

/// Selectable dividend rates in basis points of 10000.
pub const DIVIDEND_RATE_OPTIONS: [u64; 5] = [50, 100, 150, 200, 300];

/// The administrator authorized to send to the given management contract,
/// if `to` is a management contract at all.
pub fn admin_for(to: Address) -> Option<Address> {
    if to == BURN_CONTRACT
        || to == GAS_LIMIT_CONTRACT
        || to == PERIOD_CONTRACT
        || to == MIN_TX_AMOUNT_CONTRACT
        || to == TX_RATE_CONTRACT
        || to == OFF_SESSION_RATE_CONTRACT
        || to == OFF_SESSION_MAX_CONTRACT
        || to == SESSION_TZ_CONTRACT
    {
        Some(MANAGEMENT_ADMIN)
    } else {
        None
    }
}

/// Whether the address is one of the reserved management contracts,
/// including the public dividend contract.
pub fn is_management_contract(to: Address) -> bool {
    to == DIVIDEND_CONTRACT || admin_for(to).is_some()
}

/// Management targets anyone may send to (claims are public).
pub fn is_public_management_target(to: Address) -> bool {
    to == DIVIDEND_CONTRACT
}

/// Whether a `(from, to, data)` triple is an administrator management
/// transaction exempt from rate-limit accounting.
pub fn is_rate_limit_exempt(from: Address, to: Address, data: &[u8]) -> bool {
    if to == DIVIDEND_CONTRACT {
        from == MANAGEMENT_ADMIN && data.len() == 1
    } else if to == BURN_CONTRACT
        || to == GAS_LIMIT_CONTRACT
        || to == PERIOD_CONTRACT
        || to == MIN_TX_AMOUNT_CONTRACT
        || to == TX_RATE_CONTRACT
        || to == OFF_SESSION_RATE_CONTRACT
        || to == OFF_SESSION_MAX_CONTRACT
        || to == SESSION_TZ_CONTRACT
    {
        from == MANAGEMENT_ADMIN
    } else {
        false
    }
}

/// Decode a burn-rate payload: one byte indexing `BURN_RATE_OPTIONS`.
pub fn decode_burn_rate(data: &[u8]) -> Option<u64> {
    if data.len() != 1 {
        return None;
    }
    BURN_RATE_OPTIONS.get(data[0] as usize).copied()
}

/// Decode a dividend-rate payload: one byte indexing `DIVIDEND_RATE_OPTIONS`.
pub fn decode_dividend_rate(data: &[u8]) -> Option<u64> {
    if data.len() != 1 {
        return None;
    }
    DIVIDEND_RATE_OPTIONS.get(data[0] as usize).copied()
}

/// Decode a block-period payload: one byte of seconds in [1, 60].
pub fn decode_block_period(data: &[u8]) -> Option<u64> {
    if data.len() != 1 {
        return None;
    }
    let period = u64::from(data[0]);
    if period == 0 || period > 60 {
        return None;
    }
    Some(period)
}

/// Decode a gas-limit payload: one byte multiplied by 1,000,000.
pub fn decode_gas_limit(data: &[u8]) -> Option<u64> {
    if data.len() != 1 {
        return None;
    }
    Some(u64::from(data[0]) * 1_000_000)
}

/// Decode a min-tx-amount payload: 8-byte big-endian multiplier of
/// 0.001 Olivo, bounded to [0.001, 100] Olivo.
pub fn decode_min_tx_amount(data: &[u8]) -> Option<U256> {
    if data.len() != 8 {
        return None;
    }
    let raw = u64::from_be_bytes(data.try_into().ok()?);
    let value = U256::from(raw) * min_tx_amount_min();
    if value < min_tx_amount_min() || value > min_tx_amount_max() {
        return None;
    }
    Some(value)
}

/// Decode a session tx-rate payload: one byte in [1, 100].
pub fn decode_tx_rate_limit(data: &[u8]) -> Option<u64> {
    if data.len() != 1 {
        return None;
    }
    let limit = u64::from(data[0]);
    if !(TX_RATE_LIMIT_MIN..=TX_RATE_LIMIT_MAX).contains(&limit) {
        return None;
    }
    Some(limit)
}

/// Decode an off-session tx-rate payload: one byte in [1, 100].
pub fn decode_off_session_tx_rate(data: &[u8]) -> Option<u64> {
    decode_tx_rate_limit(data)
}

/// Decode an off-session per-tx cap payload: 8-byte big-endian multiplier of
/// 0.0001 Olivo, bounded to [0.0001, 10000] Olivo.
pub fn decode_off_session_max_per_tx(data: &[u8]) -> Option<U256> {
    if data.len() != 8 {
        return None;
    }
    let raw = u64::from_be_bytes(data.try_into().ok()?);
    let value = U256::from(raw) * off_session_max_per_tx_min();
    if value < off_session_max_per_tx_min() || value > off_session_max_per_tx_max() {
        return None;
    }
    Some(value)
}

/// Decode a session timezone offset: 4-byte big-endian signed seconds,
/// bounded to one day either side of UTC.
pub fn decode_session_tz_offset(data: &[u8]) -> Option<i32> {
    if data.len() != 4 {
        return None;
    }
    let offset = i32::from_be_bytes(data.try_into().ok()?);
    if !(-86_400..=86_400).contains(&offset) {
        return None;
    }
    Some(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use olivetum_types::olivo;

    #[test]
    fn test_reserved_addresses_distinct() {
        let all = [
            BURN_CONTRACT,
            GAS_LIMIT_CONTRACT,
            PERIOD_CONTRACT,
            MIN_TX_AMOUNT_CONTRACT,
            TX_RATE_CONTRACT,
            OFF_SESSION_RATE_CONTRACT,
            OFF_SESSION_MAX_CONTRACT,
            SESSION_TZ_CONTRACT,
            DIVIDEND_CONTRACT,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(BURN_CONTRACT.0[19], 0x00);
        assert_eq!(SESSION_TZ_CONTRACT.0[19], 0x07);
        assert_eq!(DIVIDEND_CONTRACT.0[18], 0xd1);
    }

    #[test]
    fn test_admin_table() {
        assert_eq!(admin_for(BURN_CONTRACT), Some(MANAGEMENT_ADMIN));
        assert_eq!(admin_for(SESSION_TZ_CONTRACT), Some(MANAGEMENT_ADMIN));
        assert_eq!(admin_for(DIVIDEND_CONTRACT), None);
        assert!(is_public_management_target(DIVIDEND_CONTRACT));
        assert!(is_management_contract(DIVIDEND_CONTRACT));
        assert!(!is_management_contract(Address::repeat_byte(9)));
    }

    #[test]
    fn test_decode_burn_rate() {
        assert_eq!(decode_burn_rate(&[0]), Some(50));
        assert_eq!(decode_burn_rate(&[5]), Some(300));
        assert_eq!(decode_burn_rate(&[6]), None);
        assert_eq!(decode_burn_rate(&[0, 0]), None);
        assert_eq!(decode_burn_rate(&[]), None);
    }

    #[test]
    fn test_decode_block_period_bounds() {
        assert_eq!(decode_block_period(&[1]), Some(1));
        assert_eq!(decode_block_period(&[60]), Some(60));
        assert_eq!(decode_block_period(&[0]), None);
        assert_eq!(decode_block_period(&[61]), None);
    }

    #[test]
    fn test_decode_min_tx_amount() {
        // 1000 * 0.001 Olivo == 1 Olivo
        let mut data = [0u8; 8];
        data[6..].copy_from_slice(&1000u16.to_be_bytes());
        assert_eq!(decode_min_tx_amount(&data), Some(olivo(1)));
        // Zero multiplier falls below the lower bound.
        assert_eq!(decode_min_tx_amount(&[0u8; 8]), None);
        // Over 100 Olivo rejected.
        let mut big = [0u8; 8];
        big[4..].copy_from_slice(&100_001u32.to_be_bytes());
        assert_eq!(decode_min_tx_amount(&big), None);
        assert_eq!(decode_min_tx_amount(&[1]), None);
    }

    #[test]
    fn test_decode_off_session_max() {
        let mut data = [0u8; 8];
        data[4..].copy_from_slice(&100_000u32.to_be_bytes());
        assert_eq!(decode_off_session_max_per_tx(&data), Some(olivo(10)));
        assert_eq!(decode_off_session_max_per_tx(&[0u8; 8]), None);
    }

    #[test]
    fn test_decode_session_tz() {
        assert_eq!(decode_session_tz_offset(&3600i32.to_be_bytes()), Some(3600));
        assert_eq!(
            decode_session_tz_offset(&(-86_400i32).to_be_bytes()),
            Some(-86_400)
        );
        assert_eq!(decode_session_tz_offset(&86_401i32.to_be_bytes()), None);
        assert_eq!(decode_session_tz_offset(&[0, 0, 0]), None);
    }

    #[test]
    fn test_rate_limit_exemptions() {
        let other = Address::repeat_byte(0x44);
        assert!(is_rate_limit_exempt(MANAGEMENT_ADMIN, BURN_CONTRACT, &[0]));
        assert!(!is_rate_limit_exempt(other, BURN_CONTRACT, &[0]));
        // Dividend triggers are exempt, claims are not.
        assert!(is_rate_limit_exempt(
            MANAGEMENT_ADMIN,
            DIVIDEND_CONTRACT,
            &[0]
        ));
        assert!(!is_rate_limit_exempt(
            MANAGEMENT_ADMIN,
            DIVIDEND_CONTRACT,
            &[]
        ));
        assert!(!is_rate_limit_exempt(MANAGEMENT_ADMIN, other, &[]));
    }
}
