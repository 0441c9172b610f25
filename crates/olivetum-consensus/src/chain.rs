//! The narrow chain-access interface the engine depends on.

use olivetum_types::{BlockHeader, H256, U256};

/// Read access to the canonical header chain.
///
/// The engine holds no back-pointer to the chain; everything it needs goes
/// through this trait, which the host implements.
pub trait ChainHeaderReader: Send + Sync {
    /// Header by hash and number, if known.
    fn get_header(&self, hash: H256, number: u64) -> Option<BlockHeader>;

    /// The current head header.
    fn current_header(&self) -> Option<BlockHeader>;

    /// Total difficulty of the given block, if known.
    fn get_td(&self, hash: H256, number: u64) -> Option<U256>;

    /// The runtime block period recorded at/after the given block, when the
    /// host persists per-block period records.
    fn block_period(&self, hash: H256, number: u64) -> Option<u64> {
        let _ = (hash, number);
        None
    }
}
