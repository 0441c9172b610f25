//! Node wiring: engine, gateway, chain view and API server.

use crate::config::NodeConfig;
use anyhow::{Context, Result};
use olivetum_api::{router, AppState, ChainAccess, SupplyInfo};
use olivetum_consensus::Engine;
use olivetum_mining::GatewayHandle;
use olivetum_params::RuntimeParams;
use olivetum_state::{
    dividend_rate, get_burn_rate, get_total_burned, get_total_dividends_minted, get_total_minted,
    load_block_period, MemoryState,
};
use olivetum_storage::IndexStore;
use olivetum_types::{BlockHeader, H256, U256};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// The node's view of the chain, backing the API while the host ledger is
/// external. Headers and state are fed in by whatever drives the node.
pub struct ChainView {
    store: Arc<IndexStore>,
    runtime: Arc<RuntimeParams>,
    state: RwLock<MemoryState>,
    headers: RwLock<HashMap<u64, BlockHeader>>,
    head: RwLock<Option<BlockHeader>>,
}

impl ChainView {
    pub fn new(store: Arc<IndexStore>, runtime: Arc<RuntimeParams>) -> Self {
        Self {
            store,
            runtime,
            state: RwLock::new(MemoryState::new()),
            headers: RwLock::new(HashMap::new()),
            head: RwLock::new(None),
        }
    }

    /// Installs a new canonical header, recording the period in effect.
    pub fn insert_header(&self, header: BlockHeader) {
        self.store
            .write_block_period(header.hash(), self.runtime.block_period())
            .ok();
        self.headers.write().insert(header.number, header.clone());
        *self.head.write() = Some(header);
    }

    pub fn state(&self) -> &RwLock<MemoryState> {
        &self.state
    }
}

impl ChainAccess for ChainView {
    fn head(&self) -> Option<BlockHeader> {
        self.head.read().clone()
    }

    fn header_by_number(&self, number: u64) -> Option<BlockHeader> {
        self.headers.read().get(&number).cloned()
    }

    fn td(&self, _hash: H256, number: u64) -> Option<U256> {
        // Without the host chain database, approximate TD as the sum of
        // canonical difficulties up to the height.
        let headers = self.headers.read();
        let mut td = U256::zero();
        for n in 0..=number {
            td += headers.get(&n)?.difficulty;
        }
        Some(td)
    }

    fn finalized_height(&self) -> u64 {
        self.store.read_finalized_height().ok().flatten().unwrap_or(0)
    }

    fn supply(&self) -> SupplyInfo {
        let state = self.state.read();
        SupplyInfo {
            total_minted: get_total_minted(&*state),
            total_burned: get_total_burned(&*state),
            dividends_minted: get_total_dividends_minted(&*state),
        }
    }

    fn burn_rate(&self) -> u64 {
        get_burn_rate(&*self.state.read())
    }

    fn dividend_rate(&self) -> u64 {
        dividend_rate(&*self.state.read(), self.runtime.dividend_rate())
    }
}

/// A running node.
pub struct Node {
    config: NodeConfig,
    engine: Arc<Engine>,
    runtime: Arc<RuntimeParams>,
    chain: Arc<ChainView>,
}

impl Node {
    pub fn new(config: NodeConfig) -> Result<Self> {
        let runtime = Arc::new(RuntimeParams::new());
        let engine = Engine::new(config.engine.to_engine_config(), Arc::clone(&runtime));
        engine.set_threads(config.sealing.threads);

        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("creating data dir {}", config.data_dir.display()))?;
        let store = Arc::new(
            IndexStore::open(&config.data_dir.join("indices")).context("opening index store")?,
        );
        let chain = Arc::new(ChainView::new(store, Arc::clone(&runtime)));

        // Adopt any block period persisted by previous runs.
        load_block_period(&*chain.state().read(), &runtime);

        Ok(Self {
            config,
            engine,
            runtime,
            chain,
        })
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn chain(&self) -> &Arc<ChainView> {
        &self.chain
    }

    /// Serves the API until interrupted.
    pub async fn run(self) -> Result<()> {
        let gateway = GatewayHandle::spawn(Arc::clone(&self.engine));
        let state = AppState::new(
            Arc::clone(&self.engine),
            gateway,
            Arc::clone(&self.runtime),
            Arc::clone(&self.chain) as Arc<dyn ChainAccess>,
        );

        let listener = tokio::net::TcpListener::bind(&self.config.api.bind_address)
            .await
            .with_context(|| format!("binding {}", self.config.api.bind_address))?;
        info!(addr = %self.config.api.bind_address, "API listening");

        axum::serve(listener, router(state))
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("shutting down");
            })
            .await?;

        self.engine.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_node() -> (Node, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = NodeConfig {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        (Node::new(config).unwrap(), dir)
    }

    #[test]
    fn test_node_boots_with_defaults() {
        let (node, _dir) = test_node();
        assert_eq!(node.engine().threads(), -1);
        assert_eq!(node.chain().finalized_height(), 0);
    }

    #[test]
    fn test_chain_view_head_and_td() {
        let (node, _dir) = test_node();
        let chain = node.chain();

        let genesis = BlockHeader {
            number: 0,
            time: 1,
            difficulty: U256::from(1_000u64),
            ..Default::default()
        };
        let child = BlockHeader {
            parent_hash: genesis.hash(),
            number: 1,
            time: 16,
            difficulty: U256::from(1_000u64),
            ..Default::default()
        };
        chain.insert_header(genesis.clone());
        chain.insert_header(child.clone());

        assert_eq!(chain.head().unwrap().number, 1);
        assert_eq!(chain.td(child.hash(), 1), Some(U256::from(2_000u64)));
        // The period in effect was persisted per block.
        assert_eq!(
            chain.store.read_block_period(child.hash()).unwrap(),
            Some(15)
        );
    }
}
