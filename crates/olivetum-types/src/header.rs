//! Block header and its RLP encoding.

use crate::keccak::keccak256;
use primitive_types::{H160, H256, U256};
use rlp::RlpStream;
use std::fmt;

/// Keccak-256 of the RLP of an empty list; the uncle hash every valid
/// Olivetum header must carry.
pub const EMPTY_UNCLE_HASH: H256 = H256(hex_literal(
    b"1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347",
));

/// Keccak-256 of the RLP of an empty trie root.
pub const EMPTY_ROOT_HASH: H256 = H256(hex_literal(
    b"56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421",
));

/// Decodes a 64-character lowercase hex literal into 32 bytes at compile time.
const fn hex_literal(hex: &[u8; 64]) -> [u8; 32] {
    const fn nibble(c: u8) -> u8 {
        match c {
            b'0'..=b'9' => c - b'0',
            b'a'..=b'f' => c - b'a' + 10,
            _ => panic!("invalid hex digit"),
        }
    }
    let mut out = [0u8; 32];
    let mut i = 0;
    while i < 32 {
        out[i] = (nibble(hex[i * 2]) << 4) | nibble(hex[i * 2 + 1]);
        i += 1;
    }
    out
}

/// 2048-bit log bloom.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Bloom(pub [u8; 256]);

impl Bloom {
    pub fn zero() -> Self {
        Bloom([0u8; 256])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Default for Bloom {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Debug for Bloom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bloom(0x{}..)", hex::encode(&self.0[..8]))
    }
}

impl rlp::Encodable for Bloom {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.encoder().encode_value(&self.0);
    }
}

/// 8-byte PoW nonce.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct BlockNonce(pub [u8; 8]);

impl BlockNonce {
    /// Encode a u64 as a big-endian nonce, matching the wire representation.
    pub fn encode(nonce: u64) -> Self {
        BlockNonce(nonce.to_be_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_u64(self) -> u64 {
        u64::from_be_bytes(self.0)
    }
}

impl fmt::Debug for BlockNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockNonce(0x{})", hex::encode(self.0))
    }
}

impl rlp::Encodable for BlockNonce {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.encoder().encode_value(&self.0);
    }
}

/// An Olivetum block header.
///
/// The post-merge fields (`withdrawals_hash`, blob gas, beacon root) are
/// carried only so the verifier can reject headers that set them; a valid
/// Olivetum header leaves them all `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub parent_hash: H256,
    pub uncle_hash: H256,
    pub coinbase: H160,
    pub state_root: H256,
    pub tx_root: H256,
    pub receipt_root: H256,
    pub bloom: Bloom,
    pub difficulty: U256,
    pub number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub time: u64,
    pub extra: Vec<u8>,
    pub mix_digest: H256,
    pub nonce: BlockNonce,
    pub base_fee: Option<U256>,
    pub withdrawals_hash: Option<H256>,
    pub blob_gas_used: Option<u64>,
    pub excess_blob_gas: Option<u64>,
    pub parent_beacon_root: Option<H256>,
}

impl Default for BlockHeader {
    fn default() -> Self {
        Self {
            parent_hash: H256::zero(),
            uncle_hash: EMPTY_UNCLE_HASH,
            coinbase: H160::zero(),
            state_root: EMPTY_ROOT_HASH,
            tx_root: EMPTY_ROOT_HASH,
            receipt_root: EMPTY_ROOT_HASH,
            bloom: Bloom::zero(),
            difficulty: U256::zero(),
            number: 0,
            gas_limit: 0,
            gas_used: 0,
            time: 0,
            extra: Vec::new(),
            mix_digest: H256::zero(),
            nonce: BlockNonce::default(),
            base_fee: None,
            withdrawals_hash: None,
            blob_gas_used: None,
            excess_blob_gas: None,
            parent_beacon_root: None,
        }
    }
}

impl BlockHeader {
    /// Keccak-256 of the full RLP encoding, identifying the header on chain.
    pub fn hash(&self) -> H256 {
        keccak256(&[&rlp::encode(self)])
    }

    /// Whether any post-merge field is populated.
    pub fn has_post_merge_fields(&self) -> bool {
        self.withdrawals_hash.is_some()
            || self.blob_gas_used.is_some()
            || self.excess_blob_gas.is_some()
            || self.parent_beacon_root.is_some()
    }
}

impl rlp::Encodable for BlockHeader {
    fn rlp_append(&self, s: &mut RlpStream) {
        let mut fields = 15;
        let optional_tail = [
            self.base_fee.is_some(),
            self.withdrawals_hash.is_some(),
            self.blob_gas_used.is_some(),
            self.excess_blob_gas.is_some(),
            self.parent_beacon_root.is_some(),
        ];
        // Optional fields are appended in order up to the last populated one.
        let tail_len = optional_tail
            .iter()
            .rposition(|present| *present)
            .map(|i| i + 1)
            .unwrap_or(0);
        fields += tail_len;

        s.begin_list(fields);
        s.append(&self.parent_hash);
        s.append(&self.uncle_hash);
        s.append(&self.coinbase);
        s.append(&self.state_root);
        s.append(&self.tx_root);
        s.append(&self.receipt_root);
        s.append(&self.bloom);
        s.append(&self.difficulty);
        s.append(&self.number);
        s.append(&self.gas_limit);
        s.append(&self.gas_used);
        s.append(&self.time);
        s.append(&self.extra);
        s.append(&self.mix_digest);
        s.append(&self.nonce);

        if tail_len > 0 {
            s.append(&self.base_fee.unwrap_or_default());
        }
        if tail_len > 1 {
            s.append(&self.withdrawals_hash.unwrap_or_default());
        }
        if tail_len > 2 {
            s.append(&self.blob_gas_used.unwrap_or_default());
        }
        if tail_len > 3 {
            s.append(&self.excess_blob_gas.unwrap_or_default());
        }
        if tail_len > 4 {
            s.append(&self.parent_beacon_root.unwrap_or_default());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_uncle_hash_constant() {
        // keccak256(rlp([])) == the canonical empty-uncles hash.
        let encoded = RlpStream::new_list(0).out();
        assert_eq!(keccak256(&[&encoded]), EMPTY_UNCLE_HASH);
    }

    #[test]
    fn test_nonce_round_trip() {
        let nonce = BlockNonce::encode(0xdead_beef_0102_0304);
        assert_eq!(nonce.to_u64(), 0xdead_beef_0102_0304);
        assert_eq!(nonce.as_bytes().len(), 8);
    }

    #[test]
    fn test_header_hash_changes_with_nonce() {
        let mut header = BlockHeader {
            number: 7,
            time: 1_000,
            difficulty: U256::from(131_072u64),
            gas_limit: 8_000_000,
            extra: b"test".to_vec(),
            ..Default::default()
        };
        let base = header.hash();
        header.nonce = BlockNonce::encode(1);
        assert_ne!(header.hash(), base);
    }

    #[test]
    fn test_header_hash_stable() {
        let header = BlockHeader {
            number: 1,
            time: 15,
            difficulty: U256::from(1u64),
            ..Default::default()
        };
        assert_eq!(header.hash(), header.hash());
    }

    #[test]
    fn test_post_merge_detection() {
        let mut header = BlockHeader::default();
        assert!(!header.has_post_merge_fields());
        header.withdrawals_hash = Some(H256::zero());
        assert!(header.has_post_merge_fields());
    }
}
