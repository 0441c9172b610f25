//! Shared fixtures for integration tests.

use olivetum_consensus::{ChainHeaderReader, Engine, EngineConfig};
use olivetum_params::RuntimeParams;
use olivetum_types::{BlockHeader, H256, U256};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A tiny engine configuration so datasets build in milliseconds.
pub fn small_engine_config() -> EngineConfig {
    EngineConfig {
        epoch_length: 32,
        dataset_init_bytes: 4096,
        dataset_growth_bytes: 0,
        mix_rounds: 16,
    }
}

/// An engine over the small configuration with no disk cache.
pub fn small_engine(runtime: Arc<RuntimeParams>) -> Arc<Engine> {
    Engine::with_cache_dir(small_engine_config(), runtime, None)
}

/// An engine caching datasets in the given directory.
pub fn cached_engine(runtime: Arc<RuntimeParams>, dir: &std::path::Path) -> Arc<Engine> {
    Engine::with_cache_dir(small_engine_config(), runtime, Some(dir.to_path_buf()))
}

/// An in-memory canonical chain for verification tests.
#[derive(Default)]
pub struct TestChain {
    headers: RwLock<HashMap<H256, BlockHeader>>,
    by_number: RwLock<HashMap<u64, H256>>,
    head: RwLock<Option<BlockHeader>>,
}

impl TestChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Installs a header as the new canonical head.
    pub fn insert(&self, header: &BlockHeader) {
        let hash = header.hash();
        self.headers.write().insert(hash, header.clone());
        self.by_number.write().insert(header.number, hash);
        *self.head.write() = Some(header.clone());
    }

    /// A genesis header suitable for the small engine.
    pub fn genesis() -> BlockHeader {
        BlockHeader {
            number: 0,
            time: 1,
            difficulty: U256::from(131_072u64),
            gas_limit: 8_000_000,
            extra: b"olivetum-test-genesis".to_vec(),
            ..Default::default()
        }
    }
}

impl ChainHeaderReader for TestChain {
    fn get_header(&self, hash: H256, number: u64) -> Option<BlockHeader> {
        self.headers
            .read()
            .get(&hash)
            .filter(|header| header.number == number)
            .cloned()
    }

    fn current_header(&self) -> Option<BlockHeader> {
        self.head.read().clone()
    }

    fn get_td(&self, _hash: H256, number: u64) -> Option<U256> {
        let by_number = self.by_number.read();
        let headers = self.headers.read();
        let mut td = U256::zero();
        for n in 0..=number {
            td += headers.get(by_number.get(&n)?)?.difficulty;
        }
        Some(td)
    }
}
