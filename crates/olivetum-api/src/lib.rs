//! # olivetum-api
//!
//! HTTP surface for the Olivetum engine and chain-info namespaces.
//!
//! This crate provides:
//! - Engine endpoints: work packages, solution submission, hashrate
//!   reports and gateway statistics for external miners
//! - Chain endpoints: runtime configuration, finalized height, supply
//!   statistics and the network hashrate estimate

mod error;
pub mod handlers;
mod openapi;
mod routes;
mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use openapi::ApiDoc;
pub use routes::router;
pub use state::{AppState, ChainAccess, SupplyInfo};
