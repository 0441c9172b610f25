//! Shared application state.

use olivetum_consensus::Engine;
use olivetum_mining::GatewayHandle;
use olivetum_params::RuntimeParams;
use olivetum_types::{BlockHeader, H256, U256};
use std::sync::Arc;

/// Supply counters read from the ledger.
#[derive(Debug, Clone, Default)]
pub struct SupplyInfo {
    pub total_minted: U256,
    pub total_burned: U256,
    pub dividends_minted: U256,
}

/// The chain data the API needs, implemented by the host node.
pub trait ChainAccess: Send + Sync {
    /// Current head header.
    fn head(&self) -> Option<BlockHeader>;

    /// Canonical header at a height.
    fn header_by_number(&self, number: u64) -> Option<BlockHeader>;

    /// Total difficulty of a block.
    fn td(&self, hash: H256, number: u64) -> Option<U256>;

    /// Finalized-height watermark.
    fn finalized_height(&self) -> u64;

    /// Supply counters from the latest state.
    fn supply(&self) -> SupplyInfo;

    /// Active burn rate in basis points.
    fn burn_rate(&self) -> u64;

    /// Active dividend rate in basis points.
    fn dividend_rate(&self) -> u64;
}

/// Shared state for API handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub gateway: GatewayHandle,
    pub runtime: Arc<RuntimeParams>,
    pub chain: Arc<dyn ChainAccess>,
}

impl AppState {
    pub fn new(
        engine: Arc<Engine>,
        gateway: GatewayHandle,
        runtime: Arc<RuntimeParams>,
        chain: Arc<dyn ChainAccess>,
    ) -> Self {
        Self {
            engine,
            gateway,
            runtime,
            chain,
        }
    }
}
