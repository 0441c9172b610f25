//! The transaction shape consumed by the admission policy.
//!
//! The node does not own transaction serialization; the host chain hands the
//! already-decoded fields to admission. Only the fields the policy inspects
//! are carried.

use primitive_types::{H160, H256, U256};

/// One access-list entry. Olivetum rejects transactions carrying these, but
/// the admission policy needs to see them to do so.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessListItem {
    pub address: H160,
    pub storage_keys: Vec<H256>,
}

/// A candidate transaction at the chain's edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub from: H160,
    /// `None` would be contract creation, which Olivetum does not admit.
    pub to: Option<H160>,
    pub value: U256,
    pub data: Vec<u8>,
    pub access_list: Vec<AccessListItem>,
    pub nonce: u64,
    pub gas_limit: u64,
    pub gas_price: U256,
}

impl Transaction {
    /// A plain value transfer with no payload.
    pub fn transfer(from: H160, to: H160, value: U256) -> Self {
        Self {
            from,
            to: Some(to),
            value,
            data: Vec::new(),
            access_list: Vec::new(),
            nonce: 0,
            gas_limit: 21_000,
            gas_price: U256::zero(),
        }
    }

    /// A zero-value transaction carrying a management payload.
    pub fn management(from: H160, to: H160, data: Vec<u8>) -> Self {
        Self {
            from,
            to: Some(to),
            value: U256::zero(),
            data,
            access_list: Vec::new(),
            nonce: 0,
            gas_limit: 30_000,
            gas_price: U256::zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_shape() {
        let from = H160::repeat_byte(1);
        let to = H160::repeat_byte(2);
        let tx = Transaction::transfer(from, to, U256::from(5u64));
        assert_eq!(tx.to, Some(to));
        assert!(tx.data.is_empty());
        assert!(tx.access_list.is_empty());
    }

    #[test]
    fn test_management_shape() {
        let tx = Transaction::management(H160::repeat_byte(1), H160::repeat_byte(3), vec![0x02]);
        assert!(tx.value.is_zero());
        assert_eq!(tx.data, vec![0x02]);
    }
}
