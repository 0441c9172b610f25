//! # olivetum-mining
//!
//! Mining support for Olivetum.
//!
//! This crate provides:
//! - A CPU sealer running one nonce-search worker per configured thread
//! - The remote-sealer gateway: a single event-loop actor serving work
//!   packages, solution submissions and hashrate reports for external
//!   miners, with per-miner statistics

mod error;
mod gateway;
mod sealer;

pub use error::{MiningError, MiningResult};
pub use gateway::{
    GatewayHandle, GatewayMinerStat, GatewayStats, SealWork, WorkProvider, ACTIVE_MINER_WINDOW,
};
pub use sealer::CpuSealer;
