//! Error types for consensus validation.

use olivetum_types::U256;
use thiserror::Error;

/// Consensus validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    /// Header extra-data exceeds the 32-byte cap.
    #[error("extra-data too long: {size} > {max}")]
    ExtraDataTooLong { size: usize, max: usize },

    /// Header timestamp is further in the future than the allowance.
    #[error("block in the future")]
    FutureBlock,

    /// Header timestamp is not strictly after the parent's.
    #[error("timestamp older than parent")]
    OlderBlockTime,

    /// Header timestamp advances less than the minimum increment.
    #[error("timestamp increment below minimum: have {have}, want >= {want}")]
    TimestampTooClose { have: u64, want: u64 },

    /// Header difficulty disagrees with the controller.
    #[error("invalid difficulty: have {have}, want {want}")]
    InvalidDifficulty { have: U256, want: U256 },

    /// Gas limit above the protocol maximum.
    #[error("invalid gasLimit: have {have}, max {max}")]
    GasLimitTooHigh { have: u64, max: u64 },

    /// Gas used above the block's gas limit.
    #[error("invalid gasUsed: have {have}, gasLimit {limit}")]
    GasUsedExceedsLimit { have: u64, limit: u64 },

    /// Gas limit moved too far from the parent's, or fell below the floor.
    #[error("invalid gas limit: have {have}, parent {parent}")]
    InvalidGasLimitDelta { have: u64, parent: u64 },

    /// A base fee is present; Olivetum has none.
    #[error("invalid baseFee: expected nil")]
    UnexpectedBaseFee,

    /// Block number is not parent + 1.
    #[error("invalid block number")]
    InvalidNumber,

    /// A post-merge header field is populated.
    #[error("unexpected post-merge field in header")]
    UnexpectedPostMergeField,

    /// Uncles are not supported.
    #[error("uncles not supported")]
    TooManyUncles,

    /// The header's parent is not known to the chain reader.
    #[error("unknown ancestor")]
    UnknownAncestor,

    /// The sealed mix digest does not match the recomputation.
    #[error("invalid mix digest")]
    InvalidMixDigest,

    /// The final digest misses the difficulty target.
    #[error("invalid proof-of-work")]
    InvalidPoW,
}

/// Result type for consensus operations.
pub type ConsensusResult<T> = Result<T, ConsensusError>;
