//! Mining error types.

use thiserror::Error;

/// Mining errors.
#[derive(Error, Debug)]
pub enum MiningError {
    /// No work package has been produced yet.
    #[error("no mining work available yet")]
    NoWork,

    /// The gateway actor has shut down.
    #[error("remote sealer stopped")]
    GatewayStopped,

    /// No work-for producer was configured.
    #[error("no work-for producer configured")]
    NoWorkProvider,

    /// The header being sealed carries no positive difficulty.
    #[error("invalid sealing difficulty")]
    InvalidSealingDifficulty,

    /// Candidate generation failed.
    #[error("work generation failed: {0}")]
    WorkFailed(String),

    /// Consensus error.
    #[error("consensus error: {0}")]
    Consensus(#[from] olivetum_consensus::ConsensusError),
}

/// Result type for mining operations.
pub type MiningResult<T> = Result<T, MiningError>;
