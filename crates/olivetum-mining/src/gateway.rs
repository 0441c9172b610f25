//! The remote-sealer gateway.
//!
//! A single event-loop actor owns every piece of gateway state: the recent
//! work packages keyed by seal hash, the currently registered results
//! channel, and per-miner statistics. External callers talk to it through
//! a command channel with one-shot reply slots; a 5-second tick prunes
//! work packages older than seven blocks behind the sealing tip.

use crate::error::{MiningError, MiningResult};
use olivetum_consensus::{difficulty_to_target, epoch_seed, Engine};
use olivetum_types::{Address, BlockHeader, BlockNonce, H256, U256};
use std::collections::HashMap;
use std::sync::mpsc::SyncSender;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// How long a miner counts as active after its last interaction.
pub const ACTIVE_MINER_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Work packages older than this many blocks behind the tip are pruned.
const STALE_WORK_THRESHOLD: u64 = 7;

const PRUNE_INTERVAL: Duration = Duration::from_secs(5);

/// A work package handed to external miners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealWork {
    /// Hash the miner grinds on.
    pub seal_hash: H256,
    /// Epoch seed identifying the dataset.
    pub epoch_seed: H256,
    /// Boundary condition: `2^256 / difficulty`.
    pub target: U256,
    /// Block number being sealed.
    pub number: u64,
}

/// Builds sealing work for a custom coinbase, returning the candidate
/// header and the channel sealed blocks should be delivered on.
pub type WorkProvider =
    dyn Fn(Address) -> MiningResult<(BlockHeader, SyncSender<BlockHeader>)> + Send + Sync;

/// Per-miner gateway statistics.
#[derive(Debug, Clone, Default)]
pub struct GatewayMinerStat {
    pub address: Address,
    pub work_count: u64,
    pub submit_count: u64,
    pub reported_hashrate: u64,
    pub last_work: Option<SystemTime>,
    pub last_submit: Option<SystemTime>,
    pub last_hashrate: Option<SystemTime>,
    pub active: bool,
}

/// Aggregated gateway statistics.
#[derive(Debug, Clone, Default)]
pub struct GatewayStats {
    pub active_miners: usize,
    pub total_reported_hashrate: u64,
    pub total_work: u64,
    pub total_submits: u64,
    pub miners: Vec<GatewayMinerStat>,
}

enum Command {
    NewWork {
        header: BlockHeader,
        results: SyncSender<BlockHeader>,
    },
    FetchWork {
        reply: oneshot::Sender<MiningResult<SealWork>>,
    },
    FetchWorkFor {
        address: Address,
        reply: oneshot::Sender<MiningResult<SealWork>>,
    },
    SubmitWork {
        nonce: BlockNonce,
        mix_digest: H256,
        seal_hash: H256,
        reply: oneshot::Sender<bool>,
    },
    SubmitHashrate {
        rate: u64,
        id: H256,
        reply: oneshot::Sender<bool>,
    },
    SubmitHashrateFor {
        address: Address,
        rate: u64,
        reply: oneshot::Sender<bool>,
    },
    FetchHashrate {
        reply: oneshot::Sender<u64>,
    },
    Stats {
        reply: oneshot::Sender<GatewayStats>,
    },
    SetWorkProvider(Arc<WorkProvider>),
}

#[derive(Default)]
struct MinerRecord {
    last_work: Option<SystemTime>,
    last_submit: Option<SystemTime>,
    last_hashrate: Option<SystemTime>,
    reported_hashrate: u64,
    work_count: u64,
    submit_count: u64,
}

impl MinerRecord {
    fn active_since(&self, now: SystemTime, window: Duration) -> bool {
        let within = |t: Option<SystemTime>| {
            t.and_then(|t| now.duration_since(t).ok())
                .map(|age| age <= window)
                .unwrap_or(false)
        };
        within(self.last_work) || within(self.last_submit) || within(self.last_hashrate)
    }
}

struct Gateway {
    engine: Arc<Engine>,
    works: HashMap<H256, BlockHeader>,
    current: Option<(BlockHeader, SealWork)>,
    results: Option<SyncSender<BlockHeader>>,
    work_provider: Option<Arc<WorkProvider>>,
    stats: HashMap<Address, MinerRecord>,
    commands: mpsc::Receiver<Command>,
}

impl Gateway {
    async fn run(mut self) {
        let mut prune_tick = tokio::time::interval(PRUNE_INTERVAL);
        prune_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        debug!("gateway command channel closed, stopping");
                        return;
                    };
                    self.handle(command);
                }
                _ = prune_tick.tick() => self.prune_stale(),
            }
        }
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::NewWork { header, results } => {
                self.results = Some(results);
                self.make_work(header);
            }
            Command::FetchWork { reply } => {
                let response = match &self.current {
                    Some((_, work)) => Ok(work.clone()),
                    None => Err(MiningError::NoWork),
                };
                let _ = reply.send(response);
            }
            Command::FetchWorkFor { address, reply } => {
                let _ = reply.send(self.make_work_for(address));
            }
            Command::SubmitWork {
                nonce,
                mix_digest,
                seal_hash,
                reply,
            } => {
                let _ = reply.send(self.submit_work(nonce, mix_digest, seal_hash));
            }
            Command::SubmitHashrate { rate, id, reply } => {
                debug!(rate, id = %id, "hashrate report");
                let _ = reply.send(true);
            }
            Command::SubmitHashrateFor {
                address,
                rate,
                reply,
            } => {
                let record = self.stats.entry(address).or_default();
                record.last_hashrate = Some(SystemTime::now());
                record.reported_hashrate = rate;
                let _ = reply.send(true);
            }
            Command::FetchHashrate { reply } => {
                let now = SystemTime::now();
                let total = self
                    .stats
                    .values()
                    .filter(|record| record.active_since(now, ACTIVE_MINER_WINDOW))
                    .map(|record| record.reported_hashrate)
                    .sum();
                let _ = reply.send(total);
            }
            Command::Stats { reply } => {
                let _ = reply.send(self.snapshot_stats());
            }
            Command::SetWorkProvider(provider) => {
                self.work_provider = Some(provider);
            }
        }
    }

    fn make_work(&mut self, header: BlockHeader) -> SealWork {
        let seal_hash = self.engine.seal_hash(&header);
        let epoch = self.engine.epoch_of(header.number);
        let work = SealWork {
            seal_hash,
            epoch_seed: H256(epoch_seed(epoch)),
            target: difficulty_to_target(header.difficulty),
            number: header.number,
        };
        debug!(number = work.number, seal_hash = %seal_hash, "new sealing work");
        self.works.insert(seal_hash, header.clone());
        self.current = Some((header, work.clone()));
        work
    }

    fn make_work_for(&mut self, address: Address) -> MiningResult<SealWork> {
        let provider = self
            .work_provider
            .as_ref()
            .ok_or(MiningError::NoWorkProvider)?
            .clone();
        let (header, results) = provider(address)?;
        self.results = Some(results);
        let record = self.stats.entry(address).or_default();
        record.last_work = Some(SystemTime::now());
        record.work_count += 1;
        Ok(self.make_work(header))
    }

    fn submit_work(&mut self, nonce: BlockNonce, mix_digest: H256, seal_hash: H256) -> bool {
        if self.current.is_none() {
            return false;
        }
        let Some(header) = self.works.get(&seal_hash) else {
            return false;
        };
        let mut sealed = header.clone();
        sealed.nonce = nonce;
        sealed.mix_digest = mix_digest;
        if let Err(err) = self.engine.verify_seal(&sealed) {
            debug!(%seal_hash, %err, "rejected work submission");
            return false;
        }

        let record = self.stats.entry(sealed.coinbase).or_default();
        record.last_submit = Some(SystemTime::now());
        record.submit_count += 1;

        let Some(results) = &self.results else {
            return false;
        };
        match results.try_send(sealed) {
            Ok(()) => {
                info!(number = header.number, "accepted remote seal");
                true
            }
            Err(_) => {
                warn!("sealed block dropped, results channel not ready");
                false
            }
        }
    }

    fn prune_stale(&mut self) {
        let Some((current, _)) = &self.current else {
            return;
        };
        let tip = current.number;
        self.works
            .retain(|_, header| header.number + STALE_WORK_THRESHOLD > tip);
    }

    fn snapshot_stats(&self) -> GatewayStats {
        let now = SystemTime::now();
        let mut stats = GatewayStats::default();
        for (address, record) in &self.stats {
            let active = record.active_since(now, ACTIVE_MINER_WINDOW);
            stats.total_work += record.work_count;
            stats.total_submits += record.submit_count;
            stats.total_reported_hashrate += record.reported_hashrate;
            if active {
                stats.active_miners += 1;
            }
            stats.miners.push(GatewayMinerStat {
                address: *address,
                work_count: record.work_count,
                submit_count: record.submit_count,
                reported_hashrate: record.reported_hashrate,
                last_work: record.last_work,
                last_submit: record.last_submit,
                last_hashrate: record.last_hashrate,
                active,
            });
        }
        stats
    }
}

/// Handle to the gateway actor.
#[derive(Clone)]
pub struct GatewayHandle {
    commands: mpsc::Sender<Command>,
}

impl GatewayHandle {
    /// Spawns the gateway actor on the current tokio runtime.
    pub fn spawn(engine: Arc<Engine>) -> Self {
        let (tx, rx) = mpsc::channel(64);
        let gateway = Gateway {
            engine,
            works: HashMap::new(),
            current: None,
            results: None,
            work_provider: None,
            stats: HashMap::new(),
            commands: rx,
        };
        tokio::spawn(gateway.run());
        Self { commands: tx }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> MiningResult<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(build(reply_tx))
            .await
            .map_err(|_| MiningError::GatewayStopped)?;
        reply_rx.await.map_err(|_| MiningError::GatewayStopped)
    }

    /// Registers the block currently being sealed, replacing the results
    /// channel sealed blocks are forwarded on.
    pub async fn set_sealing_work(
        &self,
        header: BlockHeader,
        results: SyncSender<BlockHeader>,
    ) -> MiningResult<()> {
        self.commands
            .send(Command::NewWork { header, results })
            .await
            .map_err(|_| MiningError::GatewayStopped)
    }

    /// Wires the callback producing sealing work for custom coinbases.
    pub async fn set_work_provider(&self, provider: Arc<WorkProvider>) -> MiningResult<()> {
        self.commands
            .send(Command::SetWorkProvider(provider))
            .await
            .map_err(|_| MiningError::GatewayStopped)
    }

    /// The current work package.
    pub async fn get_work(&self) -> MiningResult<SealWork> {
        self.request(|reply| Command::FetchWork { reply }).await?
    }

    /// A work package with the coinbase set to `address`.
    pub async fn get_work_for(&self, address: Address) -> MiningResult<SealWork> {
        self.request(|reply| Command::FetchWorkFor { address, reply })
            .await?
    }

    /// Submits a PoW solution. Invalid, stale and unknown work all yield
    /// `false`.
    pub async fn submit_work(
        &self,
        nonce: BlockNonce,
        mix_digest: H256,
        seal_hash: H256,
    ) -> MiningResult<bool> {
        self.request(|reply| Command::SubmitWork {
            nonce,
            mix_digest,
            seal_hash,
            reply,
        })
        .await
    }

    /// Submits a solution for work generated with a custom coinbase. The
    /// address is informational; the seal hash alone selects the work.
    pub async fn submit_work_for(
        &self,
        _address: Address,
        nonce: BlockNonce,
        mix_digest: H256,
        seal_hash: H256,
    ) -> MiningResult<bool> {
        self.submit_work(nonce, mix_digest, seal_hash).await
    }

    /// Records an anonymous hashrate report.
    pub async fn submit_hashrate(&self, rate: u64, id: H256) -> MiningResult<bool> {
        self.request(|reply| Command::SubmitHashrate { rate, id, reply })
            .await
    }

    /// Records a hashrate report attributed to a miner address.
    pub async fn submit_hashrate_for(&self, address: Address, rate: u64) -> MiningResult<bool> {
        self.request(|reply| Command::SubmitHashrateFor {
            address,
            rate,
            reply,
        })
        .await
    }

    /// Sum of reported hashrates across currently active miners.
    pub async fn reported_hashrate(&self) -> MiningResult<u64> {
        self.request(|reply| Command::FetchHashrate { reply }).await
    }

    /// Aggregated per-miner statistics.
    pub async fn stats(&self) -> MiningResult<GatewayStats> {
        self.request(|reply| Command::Stats { reply }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use olivetum_consensus::{digest_meets_target, EngineConfig};
    use olivetum_params::RuntimeParams;
    use std::sync::mpsc::sync_channel;

    fn test_engine() -> Arc<Engine> {
        let config = EngineConfig {
            epoch_length: 32,
            dataset_init_bytes: 4096,
            dataset_growth_bytes: 0,
            mix_rounds: 16,
        };
        Engine::with_cache_dir(config, Arc::new(RuntimeParams::new()), None)
    }

    fn easy_header(number: u64) -> BlockHeader {
        BlockHeader {
            number,
            time: 1,
            difficulty: U256::one(),
            gas_limit: 8_000_000,
            coinbase: Address::repeat_byte(0xaa),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_no_work_initially() {
        let gateway = GatewayHandle::spawn(test_engine());
        assert!(matches!(gateway.get_work().await, Err(MiningError::NoWork)));
    }

    #[tokio::test]
    async fn test_work_round_trip_and_submit() {
        let engine = test_engine();
        let gateway = GatewayHandle::spawn(Arc::clone(&engine));

        let header = easy_header(1);
        let (results_tx, results_rx) = sync_channel(1);
        gateway
            .set_sealing_work(header.clone(), results_tx)
            .await
            .unwrap();

        let work = gateway.get_work().await.unwrap();
        assert_eq!(work.number, 1);
        assert_eq!(work.seal_hash, engine.seal_hash(&header));
        assert_eq!(H256(epoch_seed(0)), work.epoch_seed);

        // Grind a nonce externally against the advertised work.
        let epoch = engine.epoch_of(work.number);
        let mut solution = None;
        for nonce in 0..1u64 << 16 {
            let encoded = BlockNonce::encode(nonce);
            let (mix, digest) = engine.compute_seal(work.seal_hash, encoded, epoch);
            if digest_meets_target(digest, work.target) {
                solution = Some((encoded, mix));
                break;
            }
        }
        let (nonce, mix) = solution.expect("difficulty 1 should solve immediately");

        assert!(gateway.submit_work(nonce, mix, work.seal_hash).await.unwrap());
        let sealed = results_rx.recv().unwrap();
        assert_eq!(sealed.nonce, nonce);
        assert_eq!(sealed.mix_digest, mix);
        engine.verify_seal(&sealed).unwrap();

        // Statistics recorded the submit for the coinbase.
        let stats = gateway.stats().await.unwrap();
        assert_eq!(stats.total_submits, 1);
        assert_eq!(stats.active_miners, 1);
    }

    #[tokio::test]
    async fn test_submit_unknown_work_rejected() {
        let gateway = GatewayHandle::spawn(test_engine());
        let (results_tx, _results_rx) = sync_channel(1);
        gateway
            .set_sealing_work(easy_header(1), results_tx)
            .await
            .unwrap();

        let accepted = gateway
            .submit_work(
                BlockNonce::encode(1),
                H256::repeat_byte(1),
                H256::repeat_byte(2),
            )
            .await
            .unwrap();
        assert!(!accepted);
    }

    #[tokio::test]
    async fn test_work_for_uses_provider() {
        let gateway = GatewayHandle::spawn(test_engine());
        let miner = Address::repeat_byte(0x11);

        let (results_tx, _results_rx) = sync_channel(1);
        let provider: Arc<WorkProvider> = {
            let results_tx = results_tx.clone();
            Arc::new(move |address: Address| {
                let mut header = easy_header(3);
                header.coinbase = address;
                Ok((header, results_tx.clone()))
            })
        };
        gateway.set_work_provider(provider).await.unwrap();

        let work = gateway.get_work_for(miner).await.unwrap();
        assert_eq!(work.number, 3);

        let stats = gateway.stats().await.unwrap();
        assert_eq!(stats.total_work, 1);
        assert_eq!(stats.miners.len(), 1);
        assert_eq!(stats.miners[0].address, miner);
    }

    #[tokio::test]
    async fn test_hashrate_reports() {
        let gateway = GatewayHandle::spawn(test_engine());
        let miner = Address::repeat_byte(0x22);

        assert!(gateway
            .submit_hashrate(1_000, H256::repeat_byte(1))
            .await
            .unwrap());
        assert!(gateway.submit_hashrate_for(miner, 5_000).await.unwrap());

        assert_eq!(gateway.reported_hashrate().await.unwrap(), 5_000);
        let stats = gateway.stats().await.unwrap();
        assert_eq!(stats.total_reported_hashrate, 5_000);
    }
}
