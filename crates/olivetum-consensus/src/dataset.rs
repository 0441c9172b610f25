//! Epoch dataset construction and the on-disk cache.
//!
//! Datasets are deterministic per epoch: a parallel Keccak-512 fill of
//! 64-byte chunks from an epoch-derived seed, followed by three sequential
//! cross-mixing rounds. Finished datasets are written to disk through a
//! temp file and atomic rename; loads validate the file size and delete
//! anything that does not match.

use crate::config::{align64, EngineConfig};
use olivetum_types::keccak512;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the dataset cache directory.
pub const CACHE_DIR_ENV: &str = "OLIVETUMHASH_CACHE_DIR";

/// ASCII tag mixed into every dataset seed; only the first 24 bytes are
/// used, filling seed bytes 8..32.
const DATASET_SEED_TAG: &[u8] = b"OlivetumhashDatasetSeed..........";

/// Dataset size for an epoch: `init + epoch * growth`, at least one chunk,
/// aligned up to 64 bytes.
pub fn dataset_size(epoch: u64, config: &EngineConfig) -> u64 {
    let size = config
        .dataset_init_bytes
        .saturating_add(config.dataset_growth_bytes.saturating_mul(epoch));
    align64(size.max(64))
}

/// The 32-byte epoch seed: little-endian epoch number then the seed tag.
/// External miners derive their DAG from this value.
pub fn epoch_seed(epoch: u64) -> [u8; 32] {
    let mut seed = [0u8; 32];
    seed[..8].copy_from_slice(&epoch.to_le_bytes());
    seed[8..32].copy_from_slice(&DATASET_SEED_TAG[..24]);
    seed
}

/// Default cache directory: the env override, else a per-user cache
/// location. `None` disables persistence.
pub(crate) fn default_cache_dir() -> Option<PathBuf> {
    if let Ok(custom) = std::env::var(CACHE_DIR_ENV) {
        if !custom.is_empty() {
            return Some(PathBuf::from(custom));
        }
    }
    dirs::cache_dir().map(|dir| dir.join("olivetum").join("olivetumhash"))
}

pub(crate) fn cache_file_path(dir: &Path, epoch: u64, size: u64) -> PathBuf {
    dir.join(format!("epoch-{epoch:06}-{size}.dat"))
}

/// Builds the dataset for an epoch from scratch.
pub fn build_dataset(epoch: u64, config: &EngineConfig) -> Vec<u8> {
    let size = dataset_size(epoch, config) as usize;
    let mut data = vec![0u8; size];
    let chunk_count = size / 64;
    let seed = epoch_seed(epoch);

    // Base chunks depend only on their own index, so the fill parallelizes
    // over contiguous partitions; each worker keeps a local seed buffer.
    let workers = num_cpus::get().clamp(1, chunk_count.max(1));
    let chunks_per_worker = chunk_count.div_ceil(workers);
    std::thread::scope(|scope| {
        for (worker, slice) in data.chunks_mut(chunks_per_worker * 64).enumerate() {
            scope.spawn(move || {
                let mut local_seed = seed;
                for (offset, chunk) in slice.chunks_mut(64).enumerate() {
                    let index = (worker * chunks_per_worker + offset) as u64;
                    local_seed[16..24].copy_from_slice(&index.to_le_bytes());
                    chunk.copy_from_slice(&keccak512(&[&local_seed]));
                }
            });
        }
    });

    // Three rounds of cross-mixing enforce additional memory hardness.
    let mut tmp = [0u8; 64];
    let mut reference = [0u8; 64];
    let mut tail = [0u8; 16];
    for round in 0u64..3 {
        for i in 0..chunk_count {
            let target = (i + (round as usize + 1) * 17) % chunk_count;
            reference.copy_from_slice(&data[target * 64..(target + 1) * 64]);
            let base = &data[i * 64..(i + 1) * 64];
            for j in 0..64 {
                tmp[j] = base[j] ^ reference[j];
            }
            tail[..8].copy_from_slice(&(i as u64).to_le_bytes());
            tail[8..].copy_from_slice(&round.to_le_bytes());
            data[i * 64..(i + 1) * 64].copy_from_slice(&keccak512(&[&tmp, &tail]));
        }
    }
    data
}

/// Loads a cached dataset, deleting files whose size does not match.
pub(crate) fn try_load_from_disk(dir: &Path, epoch: u64, size: u64) -> std::io::Result<Vec<u8>> {
    let path = cache_file_path(dir, epoch, size);
    let mut file = fs::File::open(&path)?;
    let meta = file.metadata()?;
    if meta.len() != size {
        drop(file);
        let _ = fs::remove_file(&path);
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("cache size mismatch ({} != {})", meta.len(), size),
        ));
    }
    let mut data = vec![0u8; size as usize];
    if let Err(err) = file.read_exact(&mut data) {
        drop(file);
        let _ = fs::remove_file(&path);
        return Err(err);
    }
    Ok(data)
}

/// Persists a dataset through a temp file and atomic rename. Failures are
/// reported but never block the in-memory build.
pub(crate) fn persist_to_disk(dir: &Path, epoch: u64, data: &[u8]) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    let path = cache_file_path(dir, epoch, data.len() as u64);
    let tmp_path = path.with_extension("dat.tmp");

    let mut tmp = fs::File::create(&tmp_path)?;
    if let Err(err) = tmp.write_all(data).and_then(|_| tmp.sync_all()) {
        drop(tmp);
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }
    drop(tmp);
    if let Err(err) = fs::rename(&tmp_path, &path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }
    info!(epoch, size = data.len(), path = %path.display(), "stored dataset in cache");
    Ok(())
}

/// Load-or-build helper used by the engine; logs cache anomalies.
pub(crate) fn load_or_build(dir: Option<&Path>, epoch: u64, config: &EngineConfig) -> Vec<u8> {
    let size = dataset_size(epoch, config);
    if let Some(dir) = dir {
        match try_load_from_disk(dir, epoch, size) {
            Ok(data) => {
                info!(epoch, size, "loaded dataset from cache");
                return data;
            }
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => {
                warn!(epoch, %err, "failed to load dataset from cache");
            }
            Err(_) => {}
        }
    }

    info!(epoch, size, "building dataset");
    let start = std::time::Instant::now();
    let data = build_dataset(epoch, config);
    info!(epoch, size, elapsed_ms = start.elapsed().as_millis() as u64, "generated dataset");

    if let Some(dir) = dir {
        if let Err(err) = persist_to_disk(dir, epoch, &data) {
            warn!(epoch, %err, "failed to persist dataset");
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> EngineConfig {
        EngineConfig {
            epoch_length: 32,
            dataset_init_bytes: 4096,
            dataset_growth_bytes: 128,
            mix_rounds: 16,
        }
        .resolve()
    }

    #[test]
    fn test_size_law() {
        let config = small_config();
        assert_eq!(dataset_size(0, &config), 4096);
        assert_eq!(dataset_size(1, &config), 4096 + 128);
        assert_eq!(dataset_size(10, &config), 4096 + 1280);

        // Tiny configurations still yield at least one chunk.
        let tiny = EngineConfig {
            epoch_length: 1,
            dataset_init_bytes: 0,
            dataset_growth_bytes: 0,
            mix_rounds: 16,
        };
        assert_eq!(dataset_size(0, &tiny), 64);
    }

    #[test]
    fn test_build_is_deterministic() {
        let config = small_config();
        let a = build_dataset(3, &config);
        let b = build_dataset(3, &config);
        assert_eq!(a, b);
        assert_eq!(a.len() as u64, dataset_size(3, &config));
        // Different epochs diverge.
        assert_ne!(a, build_dataset(4, &config));
    }

    #[test]
    fn test_seed_layout() {
        let seed = epoch_seed(7);
        assert_eq!(&seed[..8], &7u64.to_le_bytes());
        assert_eq!(&seed[8..32], &DATASET_SEED_TAG[..24]);
    }

    #[test]
    fn test_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config();
        let data = build_dataset(2, &config);

        persist_to_disk(dir.path(), 2, &data).unwrap();
        let loaded = try_load_from_disk(dir.path(), 2, data.len() as u64).unwrap();
        assert_eq!(loaded, data);

        // A truncated file is rejected and removed.
        let path = cache_file_path(dir.path(), 2, data.len() as u64);
        let file = fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(data.len() as u64 / 2).unwrap();
        drop(file);
        assert!(try_load_from_disk(dir.path(), 2, data.len() as u64).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_cache_file_name() {
        let path = cache_file_path(Path::new("/tmp/cache"), 12, 4096);
        assert_eq!(path, Path::new("/tmp/cache/epoch-000012-4096.dat"));
    }
}
