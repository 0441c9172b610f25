//! CPU nonce search.
//!
//! Each worker starts from an independent random nonce and increments from
//! there, recomputing the seal for every attempt against a copied header.
//! All workers share one abort flag; the first success wins and the rest
//! return at their next loop check.

use crate::error::{MiningError, MiningResult};
use olivetum_consensus::{difficulty_to_target, digest_meets_target, Engine};
use olivetum_types::{BlockHeader, BlockNonce};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, SyncSender, TrySendError};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, trace};

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Drives local sealing through the engine's mix function.
pub struct CpuSealer {
    engine: Arc<Engine>,
}

impl CpuSealer {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Starts sealing `header` on the configured worker count. Returns
    /// immediately; a sealed header is delivered at most once on `results`.
    /// Sealing stops when `stop` is raised, the engine closes, or a worker
    /// succeeds. A negative thread count disables local sealing.
    pub fn seal(
        &self,
        header: BlockHeader,
        results: SyncSender<BlockHeader>,
        stop: Arc<AtomicBool>,
    ) -> MiningResult<()> {
        if header.difficulty.is_zero() {
            return Err(MiningError::InvalidSealingDifficulty);
        }

        let configured = self.engine.threads();
        if configured < 0 {
            return Ok(());
        }
        let threads = if configured == 0 {
            num_cpus::get().max(1)
        } else {
            configured as usize
        };

        let target = difficulty_to_target(header.difficulty);
        let seal_hash = self.engine.seal_hash(&header);
        let epoch = self.engine.epoch_of(header.number);
        // Capacity one: the first solution parks here, later ones drop.
        let (found_tx, found_rx) = sync_channel::<BlockHeader>(1);
        let abort = Arc::new(AtomicBool::new(false));

        info!(
            number = header.number,
            difficulty = %header.difficulty,
            threads,
            "starting nonce search"
        );

        for worker_id in 0..threads {
            let engine = Arc::clone(&self.engine);
            let header = header.clone();
            let found = found_tx.clone();
            let abort = Arc::clone(&abort);
            let stop = Arc::clone(&stop);
            let start_nonce: u64 = rand::thread_rng().gen();

            std::thread::Builder::new()
                .name(format!("olivetum-seal-{worker_id}"))
                .spawn(move || {
                    mine(
                        engine, header, seal_hash, target, epoch, start_nonce, worker_id, abort,
                        stop, found,
                    );
                })
                .expect("spawn sealing worker");
        }
        drop(found_tx);

        // Forward the first solution; the abort flag releases the rest.
        let forward_stop = Arc::clone(&stop);
        std::thread::Builder::new()
            .name("olivetum-seal-wait".into())
            .spawn(move || {
                loop {
                    match found_rx.recv_timeout(Duration::from_millis(100)) {
                        Ok(sealed) => {
                            abort.store(true, Ordering::Relaxed);
                            if results.send(sealed).is_err() {
                                debug!("sealed block dropped, results receiver gone");
                            }
                            return;
                        }
                        Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {
                            if forward_stop.load(Ordering::Relaxed) {
                                abort.store(true, Ordering::Relaxed);
                                return;
                            }
                        }
                        Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => return,
                    }
                }
            })
            .expect("spawn seal watcher");

        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn mine(
    engine: Arc<Engine>,
    header: BlockHeader,
    seal_hash: olivetum_types::H256,
    target: olivetum_types::U256,
    epoch: u64,
    start_nonce: u64,
    worker_id: usize,
    abort: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    found: SyncSender<BlockHeader>,
) {
    trace!(worker_id, start_nonce, "sealing worker started");
    let mut nonce = start_nonce;
    loop {
        if abort.load(Ordering::Relaxed) || stop.load(Ordering::Relaxed) || engine.is_closed() {
            return;
        }

        let encoded = BlockNonce::encode(nonce);
        let (mix, digest) = engine.compute_seal(seal_hash, encoded, epoch);
        if digest_meets_target(digest, target) {
            let mut sealed = header.clone();
            sealed.nonce = encoded;
            sealed.mix_digest = mix;

            // Honor the header's timestamp before announcing the block.
            while unix_now() < sealed.time {
                if abort.load(Ordering::Relaxed) || stop.load(Ordering::Relaxed) {
                    return;
                }
                std::thread::sleep(Duration::from_secs(1));
            }

            match found.try_send(sealed) {
                Ok(()) => {
                    info!(worker_id, nonce, number = header.number, "sealed block found");
                }
                Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                    // Another worker's result is already in flight.
                    trace!(worker_id, "solution dropped, result already pending");
                }
            }
            return;
        }
        nonce = nonce.wrapping_add(1);
        engine.note_hashes(1);
    }
}
