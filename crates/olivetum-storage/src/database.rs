//! RocksDB-backed index store.

use olivetum_types::H256;
use rocksdb::{Options, DB};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

const PERIOD_KEY_PREFIX: &[u8] = b"olivetum-period-";
const FINALIZED_HEIGHT_KEY: &[u8] = b"olivetum-finalized-height";

/// Storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Underlying database error.
    #[error("database error: {0}")]
    Database(#[from] rocksdb::Error),

    /// A stored value had an unexpected shape.
    #[error("corrupt entry under {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

fn period_key(hash: H256) -> Vec<u8> {
    let mut key = Vec::with_capacity(PERIOD_KEY_PREFIX.len() + 32);
    key.extend_from_slice(PERIOD_KEY_PREFIX);
    key.extend_from_slice(hash.as_bytes());
    key
}

fn decode_u64(key: &[u8], value: &[u8]) -> StorageResult<u64> {
    let bytes: [u8; 8] = value.try_into().map_err(|_| StorageError::Corrupt {
        key: String::from_utf8_lossy(key).into_owned(),
        reason: format!("expected 8 bytes, got {}", value.len()),
    })?;
    Ok(u64::from_be_bytes(bytes))
}

/// The chain-local index database.
pub struct IndexStore {
    db: DB,
}

impl IndexStore {
    /// Opens (or creates) the store at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let mut options = Options::default();
        options.create_if_missing(true);
        let db = DB::open(&options, path)?;
        info!(path = %path.display(), "opened index store");
        Ok(Self { db })
    }

    /// Persists the block period (seconds) in effect after the given block.
    pub fn write_block_period(&self, hash: H256, period: u64) -> StorageResult<()> {
        self.db.put(period_key(hash), period.to_be_bytes())?;
        debug!(%hash, period, "stored block period");
        Ok(())
    }

    /// The stored block period for a block hash, if any.
    pub fn read_block_period(&self, hash: H256) -> StorageResult<Option<u64>> {
        let key = period_key(hash);
        match self.db.get(&key)? {
            Some(value) => Ok(Some(decode_u64(&key, &value)?)),
            None => Ok(None),
        }
    }

    /// Advances the finalized-height watermark. Writes below the stored
    /// watermark are ignored, keeping it monotonic.
    pub fn write_finalized_height(&self, height: u64) -> StorageResult<()> {
        if let Some(stored) = self.read_finalized_height()? {
            if height <= stored {
                return Ok(());
            }
        }
        self.db.put(FINALIZED_HEIGHT_KEY, height.to_be_bytes())?;
        debug!(height, "stored finalized height");
        Ok(())
    }

    /// The finalized-height watermark, if ever written.
    pub fn read_finalized_height(&self) -> StorageResult<Option<u64>> {
        match self.db.get(FINALIZED_HEIGHT_KEY)? {
            Some(value) => Ok(Some(decode_u64(FINALIZED_HEIGHT_KEY, &value)?)),
            None => Ok(None),
        }
    }
}
