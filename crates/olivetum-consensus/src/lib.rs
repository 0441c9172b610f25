//! # olivetum-consensus
//!
//! The Olivetumhash consensus engine: a memory-hard Proof-of-Work tailored
//! for ~15-second blocks.
//!
//! This crate provides:
//! - Epoch dataset generation with a persistent disk cache and background
//!   prefetch of the next epoch
//! - The mix/seal function mapping `(sealHash, nonce)` to a mix digest and
//!   a final 256-bit digest compared against `2^256 / difficulty`
//! - The fork-gated difficulty controller
//! - Header verification (single and batched) and the reward pipeline
//!
//! ## Dataset
//!
//! Each epoch owns a byte buffer of `init + epoch * growth` bytes (64-byte
//! aligned) generated from a seeded Keccak-512 fill plus three cross-mixing
//! rounds. At most two epochs stay resident; finished datasets persist to
//! disk as `epoch-{epoch:06}-{size}.dat` files.

mod chain;
mod config;
mod dataset;
mod difficulty;
mod engine;
mod error;
mod metrics;
mod mix;
mod rewards;

pub use chain::ChainHeaderReader;
pub use config::EngineConfig;
pub use dataset::{dataset_size, epoch_seed, CACHE_DIR_ENV};
pub use difficulty::{calc_difficulty, min_timestamp_increment, DifficultyOutcome};
pub use engine::{difficulty_to_target, digest_meets_target, Engine};
pub use error::{ConsensusError, ConsensusResult};
pub use metrics::ConsensusMetrics;
pub use mix::olive_mix;
pub use rewards::{accumulate_rewards, reward_for_block};

/// Consensus-wide constants.
pub mod params {
    use olivetum_types::U256;

    /// The difficulty floor every controller branch clamps to.
    pub const MINIMUM_DIFFICULTY: u64 = 131_072;

    /// Hard cap on a header's gas limit.
    pub const MAX_GAS_LIMIT: u64 = 0x7fff_ffff_ffff_ffff;

    /// Minimum gas limit a header may carry.
    pub const MIN_GAS_LIMIT: u64 = 5_000;

    /// Divisor bounding per-block gas-limit movement.
    pub const GAS_LIMIT_BOUND_DIVISOR: u64 = 1_024;

    /// Maximum header extra-data size in bytes.
    pub const MAXIMUM_EXTRA_DATA_SIZE: usize = 32;

    /// Seconds a header timestamp may run ahead of wall clock.
    pub const ALLOWED_FUTURE_BLOCK_SECONDS: u64 = 15;

    /// Pre-difficulty-fork clamp: max increase factor per block.
    pub const LEGACY_MAX_INCREASE_FACTOR: u64 = 3;

    /// Pre-difficulty-fork clamp: max decrease divisor per block.
    pub const LEGACY_MAX_DECREASE_DIVISOR: u64 = 8;

    pub fn minimum_difficulty() -> U256 {
        U256::from(MINIMUM_DIFFICULTY)
    }
}
