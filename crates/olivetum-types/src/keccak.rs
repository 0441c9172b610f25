//! Keccak helpers.

use primitive_types::H256;
use sha3::{Digest, Keccak256, Keccak512};

/// Keccak-256 over the concatenation of the given byte slices.
pub fn keccak256(parts: &[&[u8]]) -> H256 {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    H256::from_slice(&hasher.finalize())
}

/// Keccak-512 over the concatenation of the given byte slices.
pub fn keccak512(parts: &[&[u8]]) -> [u8; 64] {
    let mut hasher = Keccak512::new();
    for part in parts {
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut out = [0u8; 64];
    out.copy_from_slice(&digest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_empty() {
        // keccak256("") is a well-known constant.
        let hash = keccak256(&[]);
        assert_eq!(
            hex::encode(hash),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_keccak256_concat_equals_joined() {
        let joined = keccak256(&[b"hello world"]);
        let split = keccak256(&[b"hello ", b"world"]);
        assert_eq!(joined, split);
    }

    #[test]
    fn test_keccak512_width() {
        let digest = keccak512(&[b"x"]);
        assert_eq!(digest.len(), 64);
        assert_ne!(digest, [0u8; 64]);
    }
}
