//! The Olivetumhash engine: dataset residency, sealing hashes, header
//! verification and the difficulty entry points.

use crate::chain::ChainHeaderReader;
use crate::config::{EngineConfig, MAX_CACHED_DATASETS};
use crate::dataset::{default_cache_dir, load_or_build};
use crate::difficulty::{calc_difficulty_with_outcome, min_timestamp_increment};
use crate::error::{ConsensusError, ConsensusResult};
use crate::metrics::ConsensusMetrics;
use crate::mix::olive_mix;
use crate::params::{
    ALLOWED_FUTURE_BLOCK_SECONDS, GAS_LIMIT_BOUND_DIVISOR, MAXIMUM_EXTRA_DATA_SIZE, MAX_GAS_LIMIT,
    MIN_GAS_LIMIT,
};
use olivetum_params::RuntimeParams;
use olivetum_types::{keccak256, BlockHeader, BlockNonce, H256, U256, U512};
use parking_lot::{Mutex, RwLock};
use rlp::RlpStream;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// `2^256 / difficulty`, the boundary a final digest must not exceed.
pub fn difficulty_to_target(difficulty: U256) -> U256 {
    if difficulty.is_zero() {
        return U256::zero();
    }
    let max = (U512::one() << 256u32) - U512::one();
    U256::try_from(max / U512::from(difficulty)).unwrap_or(U256::MAX)
}

/// Big-endian comparison of a final digest against the target.
pub fn digest_meets_target(digest: H256, target: U256) -> bool {
    if target.is_zero() {
        return false;
    }
    U256::from_big_endian(digest.as_bytes()) <= target
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// The memory-hard PoW engine.
pub struct Engine {
    config: EngineConfig,
    runtime: Arc<RuntimeParams>,
    datasets: RwLock<HashMap<u64, Arc<Vec<u8>>>>,
    prefetching: Mutex<HashSet<u64>>,
    cache_dir: Option<PathBuf>,
    threads: AtomicI64,
    fake_full: bool,
    metrics: ConsensusMetrics,
    total_hashes: AtomicU64,
    hashrate: AtomicU64,
    last_hash_count: AtomicU64,
    exit: AtomicBool,
}

impl Engine {
    /// Creates an engine with the given configuration and starts the
    /// once-per-second hashrate sampler.
    pub fn new(config: EngineConfig, runtime: Arc<RuntimeParams>) -> Arc<Self> {
        Self::build(config, runtime, default_cache_dir(), false)
    }

    /// An engine that skips PoW and header verification, for tests.
    pub fn new_faker(runtime: Arc<RuntimeParams>) -> Arc<Self> {
        Self::build(EngineConfig::default(), runtime, None, true)
    }

    /// An engine with an explicit dataset cache directory (`None` disables
    /// persistence), for tests and tooling.
    pub fn with_cache_dir(
        config: EngineConfig,
        runtime: Arc<RuntimeParams>,
        cache_dir: Option<PathBuf>,
    ) -> Arc<Self> {
        Self::build(config, runtime, cache_dir, false)
    }

    fn build(
        config: EngineConfig,
        runtime: Arc<RuntimeParams>,
        cache_dir: Option<PathBuf>,
        fake_full: bool,
    ) -> Arc<Self> {
        let engine = Arc::new(Self {
            config: config.resolve(),
            runtime,
            datasets: RwLock::new(HashMap::new()),
            prefetching: Mutex::new(HashSet::new()),
            cache_dir,
            threads: AtomicI64::new(0),
            fake_full,
            metrics: ConsensusMetrics::new(),
            total_hashes: AtomicU64::new(0),
            hashrate: AtomicU64::new(0),
            last_hash_count: AtomicU64::new(0),
            exit: AtomicBool::new(false),
        });
        Self::spawn_hashrate_sampler(Arc::downgrade(&engine));
        engine
    }

    fn spawn_hashrate_sampler(engine: Weak<Engine>) {
        std::thread::Builder::new()
            .name("olivetum-hashrate".into())
            .spawn(move || loop {
                std::thread::sleep(Duration::from_secs(1));
                let Some(engine) = engine.upgrade() else {
                    return;
                };
                if engine.exit.load(Ordering::Relaxed) {
                    return;
                }
                engine.sample_hashrate();
            })
            .expect("spawn hashrate sampler");
    }

    fn sample_hashrate(&self) {
        let current = self.total_hashes.load(Ordering::Relaxed);
        let previous = self.last_hash_count.swap(current, Ordering::Relaxed);
        if current >= previous {
            self.hashrate.store(current - previous, Ordering::Relaxed);
        } else {
            // Counter wrapped; reset to avoid a bogus delta.
            self.hashrate.store(current, Ordering::Relaxed);
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn runtime(&self) -> &Arc<RuntimeParams> {
        &self.runtime
    }

    pub fn metrics(&self) -> &ConsensusMetrics {
        &self.metrics
    }

    /// Whether this engine bypasses verification.
    pub fn is_faker(&self) -> bool {
        self.fake_full
    }

    /// Configured mining threads: 0 means one per CPU, negative disables
    /// local sealing.
    pub fn threads(&self) -> i64 {
        self.threads.load(Ordering::Relaxed)
    }

    pub fn set_threads(&self, threads: i64) {
        self.threads.store(threads, Ordering::Relaxed);
    }

    /// Locally observed hash rate, sampled once per second.
    pub fn local_hashrate(&self) -> u64 {
        self.hashrate.load(Ordering::Relaxed)
    }

    /// Records sealed attempts from mining workers.
    pub fn note_hashes(&self, count: u64) {
        self.total_hashes.fetch_add(count, Ordering::Relaxed);
    }

    /// Signals background tasks to stop.
    pub fn close(&self) {
        self.exit.store(true, Ordering::Relaxed);
    }

    pub fn is_closed(&self) -> bool {
        self.exit.load(Ordering::Relaxed)
    }

    /// Dataset epoch covering a block number.
    pub fn epoch_of(&self, number: u64) -> u64 {
        number / self.config.epoch_length
    }

    /// The dataset for an epoch, building or loading it if needed.
    /// Idempotent per epoch; concurrent callers serialize on the build.
    pub fn dataset(self: &Arc<Self>, epoch: u64) -> Arc<Vec<u8>> {
        if let Some(data) = self.datasets.read().get(&epoch) {
            return Arc::clone(data);
        }

        let data = Arc::new(load_or_build(self.cache_dir.as_deref(), epoch, &self.config));
        let mut datasets = self.datasets.write();
        if let Some(existing) = datasets.get(&epoch) {
            return Arc::clone(existing);
        }
        datasets.insert(epoch, Arc::clone(&data));
        Self::evict_old_locked(&mut datasets, epoch);
        data
    }

    fn evict_old_locked(datasets: &mut HashMap<u64, Arc<Vec<u8>>>, current: u64) {
        if datasets.len() <= MAX_CACHED_DATASETS {
            return;
        }
        if let Some(oldest) = datasets.keys().copied().min() {
            if oldest != current {
                datasets.remove(&oldest);
                debug!(epoch = oldest, "evicted dataset");
            }
        }
    }

    /// Schedules a background build of an epoch if it is neither resident
    /// nor already being prefetched.
    pub fn prefetch(self: &Arc<Self>, epoch: u64) {
        if self.datasets.read().contains_key(&epoch) {
            return;
        }
        {
            let mut prefetching = self.prefetching.lock();
            if !prefetching.insert(epoch) {
                return;
            }
        }
        info!(epoch, "prefetching dataset");
        let engine = Arc::clone(self);
        std::thread::Builder::new()
            .name(format!("olivetum-prefetch-{epoch}"))
            .spawn(move || {
                let data = engine.dataset(epoch);
                info!(epoch, size = data.len(), "finished dataset prefetch");
                engine.prefetching.lock().remove(&epoch);
            })
            .expect("spawn prefetch thread");
    }

    /// Computes `(mixDigest, finalDigest)` for a seal hash and nonce,
    /// kicking off a prefetch of the next epoch to smooth transitions.
    pub fn compute_seal(self: &Arc<Self>, seal_hash: H256, nonce: BlockNonce, epoch: u64) -> (H256, H256) {
        let dataset = self.dataset(epoch);
        self.prefetch(epoch + 1);
        olive_mix(seal_hash, nonce, &dataset, self.config.mix_rounds)
    }

    /// The hash miners grind on: Keccak-256 of the RLP of every header
    /// field except the nonce and mix digest.
    pub fn seal_hash(&self, header: &BlockHeader) -> H256 {
        let mut fields = 13;
        if header.base_fee.is_some() {
            fields += 1;
        }
        let mut s = RlpStream::new_list(fields);
        s.append(&header.parent_hash);
        s.append(&header.uncle_hash);
        s.append(&header.coinbase);
        s.append(&header.state_root);
        s.append(&header.tx_root);
        s.append(&header.receipt_root);
        s.append(&header.bloom);
        s.append(&header.difficulty);
        s.append(&header.number);
        s.append(&header.gas_limit);
        s.append(&header.gas_used);
        s.append(&header.time);
        s.append(&header.extra);
        if let Some(base_fee) = header.base_fee {
            s.append(&base_fee);
        }
        keccak256(&[&s.out()])
    }

    /// Recomputes the seal and checks both the mix digest and the target.
    pub fn verify_seal(self: &Arc<Self>, header: &BlockHeader) -> ConsensusResult<()> {
        if header.difficulty.is_zero() {
            return Err(ConsensusError::InvalidPoW);
        }
        let seal_hash = self.seal_hash(header);
        let epoch = self.epoch_of(header.number);
        let (mix, digest) = self.compute_seal(seal_hash, header.nonce, epoch);
        if mix != header.mix_digest {
            return Err(ConsensusError::InvalidMixDigest);
        }
        let target = difficulty_to_target(header.difficulty);
        if !digest_meets_target(digest, target) {
            return Err(ConsensusError::InvalidPoW);
        }
        Ok(())
    }

    /// The runtime block period effective on top of `parent`, preferring a
    /// chain-persisted record over the runtime mirror.
    pub fn resolve_block_period(
        &self,
        chain: Option<&dyn ChainHeaderReader>,
        parent: Option<&BlockHeader>,
    ) -> u64 {
        if let (Some(chain), Some(parent)) = (chain, parent) {
            if let Some(stored) = chain.block_period(parent.hash(), parent.number) {
                if stored != 0 {
                    return stored;
                }
            }
        }
        self.runtime.block_period().max(1)
    }

    /// The difficulty required of a child sealed at `time` on top of
    /// `parent`.
    pub fn calc_difficulty(
        &self,
        chain: Option<&dyn ChainHeaderReader>,
        time: u64,
        parent: &BlockHeader,
    ) -> U256 {
        let period = self.resolve_block_period(chain, Some(parent));
        let (difficulty, outcome) = calc_difficulty_with_outcome(
            &self.runtime,
            time,
            parent.difficulty,
            parent.time,
            parent.number,
            period,
        );
        if outcome.upper_clamped {
            self.metrics.record_difficulty_clamp();
        }
        difficulty
    }

    /// Verifies a single header against its parent fetched from the chain.
    pub fn verify_header(
        self: &Arc<Self>,
        chain: &dyn ChainHeaderReader,
        header: &BlockHeader,
        seal: bool,
    ) -> ConsensusResult<()> {
        if self.fake_full {
            return Ok(());
        }
        if chain.get_header(header.hash(), header.number).is_some() {
            return Ok(());
        }
        let parent = chain
            .get_header(header.parent_hash, header.number.wrapping_sub(1))
            .ok_or(ConsensusError::UnknownAncestor)?;
        self.verify_header_against(chain, header, &parent, seal, unix_now())
    }

    /// Verifies a contiguous batch of headers, preferring in-batch parents
    /// so a downloaded segment validates before insertion. Results are
    /// delivered in input order; setting `abort` stops the batch early.
    pub fn verify_headers(
        self: &Arc<Self>,
        chain: Arc<dyn ChainHeaderReader>,
        headers: Vec<BlockHeader>,
        seals: Vec<bool>,
    ) -> (Arc<AtomicBool>, mpsc::Receiver<ConsensusResult<()>>) {
        let abort = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = mpsc::channel();

        if self.fake_full || headers.is_empty() {
            for _ in &headers {
                let _ = sender.send(Ok(()));
            }
            return (abort, receiver);
        }

        let engine = Arc::clone(self);
        let abort_flag = Arc::clone(&abort);
        std::thread::Builder::new()
            .name("olivetum-verify".into())
            .spawn(move || {
                // One stable timestamp for the whole batch.
                let now = unix_now();
                for (i, header) in headers.iter().enumerate() {
                    if abort_flag.load(Ordering::Relaxed) {
                        return;
                    }
                    let seal = seals.get(i).copied().unwrap_or(true);

                    let parent = if i > 0
                        && headers[i - 1].hash() == header.parent_hash
                        && headers[i - 1].number + 1 == header.number
                    {
                        Some(headers[i - 1].clone())
                    } else {
                        chain.get_header(header.parent_hash, header.number.wrapping_sub(1))
                    };

                    let result = match parent {
                        Some(parent) => {
                            engine.verify_header_against(chain.as_ref(), header, &parent, seal, now)
                        }
                        None => Err(ConsensusError::UnknownAncestor),
                    };
                    if sender.send(result).is_err() {
                        return;
                    }
                }
            })
            .expect("spawn verify thread");

        (abort, receiver)
    }

    /// The ordered header checks from cheap to expensive.
    pub fn verify_header_against(
        self: &Arc<Self>,
        chain: &dyn ChainHeaderReader,
        header: &BlockHeader,
        parent: &BlockHeader,
        seal: bool,
        unix_now: u64,
    ) -> ConsensusResult<()> {
        if header.extra.len() > MAXIMUM_EXTRA_DATA_SIZE {
            return Err(ConsensusError::ExtraDataTooLong {
                size: header.extra.len(),
                max: MAXIMUM_EXTRA_DATA_SIZE,
            });
        }
        if header.time > unix_now + ALLOWED_FUTURE_BLOCK_SECONDS {
            return Err(ConsensusError::FutureBlock);
        }
        if header.time <= parent.time {
            return Err(ConsensusError::OlderBlockTime);
        }
        let period = self.resolve_block_period(Some(chain), Some(parent));
        let post_fork = self.runtime.is_after_difficulty_fork(header.number);
        let min_delta = min_timestamp_increment(&self.runtime, period, post_fork);
        if header.time - parent.time < min_delta {
            self.metrics.record_timestamp_too_close();
            return Err(ConsensusError::TimestampTooClose {
                have: header.time - parent.time,
                want: min_delta,
            });
        }
        let expected = self.calc_difficulty(Some(chain), header.time, parent);
        if expected != header.difficulty {
            return Err(ConsensusError::InvalidDifficulty {
                have: header.difficulty,
                want: expected,
            });
        }
        if header.gas_limit > MAX_GAS_LIMIT {
            return Err(ConsensusError::GasLimitTooHigh {
                have: header.gas_limit,
                max: MAX_GAS_LIMIT,
            });
        }
        if header.gas_used > header.gas_limit {
            return Err(ConsensusError::GasUsedExceedsLimit {
                have: header.gas_used,
                limit: header.gas_limit,
            });
        }
        if header.base_fee.is_some() {
            return Err(ConsensusError::UnexpectedBaseFee);
        }
        verify_gas_limit_delta(parent.gas_limit, header.gas_limit)?;
        if header.number != parent.number.wrapping_add(1) {
            return Err(ConsensusError::InvalidNumber);
        }
        if header.has_post_merge_fields() {
            return Err(ConsensusError::UnexpectedPostMergeField);
        }
        if !seal {
            return Ok(());
        }
        self.verify_seal(header)
    }

    /// Rejects any block carrying uncles.
    pub fn verify_uncles(&self, uncle_count: usize) -> ConsensusResult<()> {
        if self.fake_full {
            return Ok(());
        }
        if uncle_count > 0 {
            return Err(ConsensusError::TooManyUncles);
        }
        Ok(())
    }

    /// Prepares a candidate header for sealing: lifts the timestamp to the
    /// minimum increment, fills in the difficulty and clears the seal.
    pub fn prepare(
        self: &Arc<Self>,
        chain: &dyn ChainHeaderReader,
        header: &mut BlockHeader,
    ) -> ConsensusResult<()> {
        let parent = chain
            .get_header(header.parent_hash, header.number.wrapping_sub(1))
            .ok_or(ConsensusError::UnknownAncestor)?;

        let period = self.resolve_block_period(Some(chain), Some(&parent));
        let post_fork = self.runtime.is_after_difficulty_fork(parent.number + 1);
        let earliest = parent.time + min_timestamp_increment(&self.runtime, period, post_fork);
        if header.time < earliest {
            header.time = earliest;
        }

        header.difficulty = self.calc_difficulty(Some(chain), header.time, &parent);
        header.mix_digest = H256::zero();
        header.nonce = BlockNonce::default();
        Ok(())
    }
}

/// Gas-limit movement rule: within `parent / 1024` of the parent's and
/// never below the protocol minimum.
fn verify_gas_limit_delta(parent: u64, header: u64) -> ConsensusResult<()> {
    let diff = parent.abs_diff(header);
    let limit = parent / GAS_LIMIT_BOUND_DIVISOR;
    if diff >= limit || header < MIN_GAS_LIMIT {
        return Err(ConsensusError::InvalidGasLimitDelta {
            have: header,
            parent,
        });
    }
    Ok(())
}
