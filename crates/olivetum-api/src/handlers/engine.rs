//! Engine namespace: mining work, submissions, hashrate, gateway stats.

use crate::handlers::{parse_address, parse_h256, parse_nonce};
use crate::{ApiResult, AppState};
use axum::extract::{Path, State};
use axum::Json;
use olivetum_mining::{GatewayMinerStat, GatewayStats, SealWork};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use utoipa::ToSchema;

fn unix_secs(time: Option<SystemTime>) -> Option<u64> {
    time.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
}

/// Work package for external miners.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkResponse {
    /// Seal hash to grind on.
    #[schema(example = "0x83f1...")]
    pub header_hash: String,
    /// Epoch seed identifying the dataset.
    #[schema(example = "0x0200...")]
    pub seed_hash: String,
    /// Boundary condition: 2^256 / difficulty.
    #[schema(example = "0x00000000ffff...")]
    pub target: String,
    /// Number of the block being sealed.
    #[schema(example = 128)]
    pub block_number: u64,
}

impl From<SealWork> for WorkResponse {
    fn from(work: SealWork) -> Self {
        let mut target = [0u8; 32];
        work.target.to_big_endian(&mut target);
        Self {
            header_hash: format!("0x{}", hex::encode(work.seal_hash)),
            seed_hash: format!("0x{}", hex::encode(work.epoch_seed)),
            target: format!("0x{}", hex::encode(target)),
            block_number: work.number,
        }
    }
}

/// Solution submission.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitWorkRequest {
    /// 8-byte nonce, hex encoded.
    #[schema(example = "0x0000000000a1b2c3")]
    pub nonce: String,
    /// Seal hash the solution is for.
    #[schema(example = "0x83f1...")]
    pub header_hash: String,
    /// Mix digest produced by the solution.
    #[schema(example = "0x6d8f...")]
    pub mix_digest: String,
}

/// Acceptance flag for submissions.
#[derive(Serialize, ToSchema)]
pub struct AcceptedResponse {
    pub accepted: bool,
}

/// Hashrate report.
#[derive(Deserialize, ToSchema)]
pub struct HashrateRequest {
    /// Reported rate in hashes per second.
    #[schema(example = 1200000)]
    pub rate: u64,
    /// Unique reporter identifier.
    #[schema(example = "0x59da...")]
    pub id: String,
}

/// Combined hashrate of the local sealer and active remote miners.
#[derive(Serialize, ToSchema)]
pub struct HashrateResponse {
    pub hashrate: u64,
}

/// Per-miner gateway statistics entry.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MinerStatResponse {
    pub address: String,
    pub work_count: u64,
    pub submit_count: u64,
    pub reported_hashrate: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_work: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_submit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_hashrate: Option<u64>,
    pub active: bool,
}

impl From<GatewayMinerStat> for MinerStatResponse {
    fn from(stat: GatewayMinerStat) -> Self {
        Self {
            address: format!("0x{}", hex::encode(stat.address)),
            work_count: stat.work_count,
            submit_count: stat.submit_count,
            reported_hashrate: stat.reported_hashrate,
            last_work: unix_secs(stat.last_work),
            last_submit: unix_secs(stat.last_submit),
            last_hashrate: unix_secs(stat.last_hashrate),
            active: stat.active,
        }
    }
}

/// Aggregated gateway statistics.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatsResponse {
    pub active_miners: usize,
    pub total_reported_hashrate: u64,
    pub total_work: u64,
    pub total_submits: u64,
    pub miners: Vec<MinerStatResponse>,
}

impl From<GatewayStats> for GatewayStatsResponse {
    fn from(stats: GatewayStats) -> Self {
        Self {
            active_miners: stats.active_miners,
            total_reported_hashrate: stats.total_reported_hashrate,
            total_work: stats.total_work,
            total_submits: stats.total_submits,
            miners: stats.miners.into_iter().map(Into::into).collect(),
        }
    }
}

/// GET /engine/work
///
/// The current work package for external miners.
#[utoipa::path(
    get,
    path = "/engine/work",
    tag = "engine",
    responses(
        (status = 200, description = "Current work package", body = WorkResponse),
        (status = 404, description = "No work available", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_work(State(state): State<AppState>) -> ApiResult<Json<WorkResponse>> {
    let work = state.gateway.get_work().await?;
    Ok(Json(work.into()))
}

/// GET /engine/work/{address}
///
/// A work package whose coinbase is the given address.
#[utoipa::path(
    get,
    path = "/engine/work/{address}",
    tag = "engine",
    params(("address" = String, Path, description = "Coinbase address, hex encoded")),
    responses(
        (status = 200, description = "Work package for the address", body = WorkResponse),
        (status = 400, description = "Malformed address", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_work_for(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<Json<WorkResponse>> {
    let address = parse_address(&address)?;
    let work = state.gateway.get_work_for(address).await?;
    Ok(Json(work.into()))
}

/// POST /engine/submit-work
///
/// Submits a PoW solution. Invalid, stale and unknown work all report
/// `accepted: false`.
#[utoipa::path(
    post,
    path = "/engine/submit-work",
    tag = "engine",
    request_body = SubmitWorkRequest,
    responses(
        (status = 200, description = "Submission outcome", body = AcceptedResponse)
    )
)]
pub async fn submit_work(
    State(state): State<AppState>,
    Json(request): Json<SubmitWorkRequest>,
) -> ApiResult<Json<AcceptedResponse>> {
    let nonce = parse_nonce(&request.nonce)?;
    let seal_hash = parse_h256(&request.header_hash)?;
    let mix_digest = parse_h256(&request.mix_digest)?;
    let accepted = state.gateway.submit_work(nonce, mix_digest, seal_hash).await?;
    Ok(Json(AcceptedResponse { accepted }))
}

/// POST /engine/submit-work/{address}
///
/// Submission variant carrying the miner address for statistics; the seal
/// hash alone selects the work package.
#[utoipa::path(
    post,
    path = "/engine/submit-work/{address}",
    tag = "engine",
    params(("address" = String, Path, description = "Miner address, hex encoded")),
    request_body = SubmitWorkRequest,
    responses(
        (status = 200, description = "Submission outcome", body = AcceptedResponse)
    )
)]
pub async fn submit_work_for(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Json(request): Json<SubmitWorkRequest>,
) -> ApiResult<Json<AcceptedResponse>> {
    let address = parse_address(&address)?;
    let nonce = parse_nonce(&request.nonce)?;
    let seal_hash = parse_h256(&request.header_hash)?;
    let mix_digest = parse_h256(&request.mix_digest)?;
    let accepted = state
        .gateway
        .submit_work_for(address, nonce, mix_digest, seal_hash)
        .await?;
    Ok(Json(AcceptedResponse { accepted }))
}

/// GET /engine/hashrate
///
/// The local sealing rate plus reported rates of active remote miners.
#[utoipa::path(
    get,
    path = "/engine/hashrate",
    tag = "engine",
    responses(
        (status = 200, description = "Combined hashrate", body = HashrateResponse)
    )
)]
pub async fn get_hashrate(State(state): State<AppState>) -> ApiResult<Json<HashrateResponse>> {
    let local = state.engine.local_hashrate();
    let remote = state.gateway.reported_hashrate().await?;
    Ok(Json(HashrateResponse {
        hashrate: local + remote,
    }))
}

/// POST /engine/hashrate
///
/// Anonymous hashrate report.
#[utoipa::path(
    post,
    path = "/engine/hashrate",
    tag = "engine",
    request_body = HashrateRequest,
    responses(
        (status = 200, description = "Report outcome", body = AcceptedResponse)
    )
)]
pub async fn submit_hashrate(
    State(state): State<AppState>,
    Json(request): Json<HashrateRequest>,
) -> ApiResult<Json<AcceptedResponse>> {
    let id = parse_h256(&request.id)?;
    let accepted = state.gateway.submit_hashrate(request.rate, id).await?;
    Ok(Json(AcceptedResponse { accepted }))
}

/// POST /engine/hashrate/{address}
///
/// Hashrate report attributed to a miner address.
#[utoipa::path(
    post,
    path = "/engine/hashrate/{address}",
    tag = "engine",
    params(("address" = String, Path, description = "Miner address, hex encoded")),
    request_body = HashrateRequest,
    responses(
        (status = 200, description = "Report outcome", body = AcceptedResponse)
    )
)]
pub async fn submit_hashrate_for(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Json(request): Json<HashrateRequest>,
) -> ApiResult<Json<AcceptedResponse>> {
    let address = parse_address(&address)?;
    let accepted = state
        .gateway
        .submit_hashrate_for(address, request.rate)
        .await?;
    Ok(Json(AcceptedResponse { accepted }))
}

/// GET /engine/gateway/stats
///
/// Aggregated statistics for miners using the remote-sealer gateway.
#[utoipa::path(
    get,
    path = "/engine/gateway/stats",
    tag = "engine",
    responses(
        (status = 200, description = "Gateway statistics", body = GatewayStatsResponse)
    )
)]
pub async fn gateway_stats(
    State(state): State<AppState>,
) -> ApiResult<Json<GatewayStatsResponse>> {
    let stats = state.gateway.stats().await?;
    Ok(Json(stats.into()))
}
