//! Chain namespace: runtime configuration, finalized height, supply and
//! network hashrate.

use crate::{ApiError, ApiResult, AppState};
use axum::extract::{Query, State};
use axum::Json;
use olivetum_params::max_supply;
use olivetum_types::U256;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn hex_u256(value: U256) -> String {
    format!("0x{value:x}")
}

/// The currently active runtime parameters.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfigResponse {
    #[schema(example = 15)]
    pub block_period: u64,
    #[schema(example = 4712388)]
    pub gas_limit: u64,
    /// Wei, hex encoded.
    #[schema(example = "0x8ac7230489e80000")]
    pub min_tx_amount: String,
    #[schema(example = 5)]
    pub tx_rate_limit: u64,
    #[schema(example = 2)]
    pub off_session_tx_rate: u64,
    /// Wei, hex encoded.
    #[schema(example = "0x21e19e0c9bab2400000")]
    pub off_session_max_per_tx: String,
    #[schema(example = 0)]
    pub session_tz_offset_seconds: i64,
    #[schema(example = 50)]
    pub burn_rate: u64,
    #[schema(example = 50)]
    pub dividend_rate: u64,
}

/// Finalized-height watermark.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedHeightResponse {
    #[schema(example = 1024)]
    pub finalized_height: u64,
}

/// Supply statistics.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplyResponse {
    pub total_minted: String,
    pub max_supply: String,
    pub remaining: String,
    pub burn_rate: u64,
    pub dividend_rate: u64,
    pub burned: String,
    pub dividends_minted: String,
}

#[derive(Deserialize, ToSchema)]
pub struct NetworkHashrateQuery {
    /// Averaging window in blocks; defaults to 120.
    pub window: Option<u64>,
}

/// Network hashrate estimate.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkHashrateResponse {
    /// Total-difficulty delta divided by elapsed seconds over the window.
    pub hashrate: String,
    pub window: u64,
}

/// GET /chain/runtime-config
#[utoipa::path(
    get,
    path = "/chain/runtime-config",
    tag = "chain",
    responses(
        (status = 200, description = "Active runtime parameters", body = RuntimeConfigResponse)
    )
)]
pub async fn runtime_config(State(state): State<AppState>) -> Json<RuntimeConfigResponse> {
    let runtime = &state.runtime;
    Json(RuntimeConfigResponse {
        block_period: runtime.block_period(),
        gas_limit: runtime.gas_limit(),
        min_tx_amount: hex_u256(runtime.min_tx_amount()),
        tx_rate_limit: runtime.tx_rate_limit(),
        off_session_tx_rate: runtime.off_session_tx_rate(),
        off_session_max_per_tx: hex_u256(runtime.off_session_max_per_tx()),
        session_tz_offset_seconds: runtime.session_tz_offset(),
        burn_rate: state.chain.burn_rate(),
        dividend_rate: state.chain.dividend_rate(),
    })
}

/// GET /chain/finalized-height
#[utoipa::path(
    get,
    path = "/chain/finalized-height",
    tag = "chain",
    responses(
        (status = 200, description = "Finalized height", body = FinalizedHeightResponse)
    )
)]
pub async fn finalized_height(State(state): State<AppState>) -> Json<FinalizedHeightResponse> {
    Json(FinalizedHeightResponse {
        finalized_height: state.chain.finalized_height(),
    })
}

/// GET /chain/supply
#[utoipa::path(
    get,
    path = "/chain/supply",
    tag = "chain",
    responses(
        (status = 200, description = "Supply statistics", body = SupplyResponse)
    )
)]
pub async fn supply(State(state): State<AppState>) -> Json<SupplyResponse> {
    let info = state.chain.supply();
    let cap = max_supply();
    let remaining = cap.saturating_sub(info.total_minted);
    Json(SupplyResponse {
        total_minted: hex_u256(info.total_minted),
        max_supply: hex_u256(cap),
        remaining: hex_u256(remaining),
        burn_rate: state.chain.burn_rate(),
        dividend_rate: state.chain.dividend_rate(),
        burned: hex_u256(info.total_burned),
        dividends_minted: hex_u256(info.dividends_minted),
    })
}

/// GET /chain/network-hashrate
///
/// Approximates the network hashrate as the total-difficulty delta over
/// the elapsed time across the last `window` blocks.
#[utoipa::path(
    get,
    path = "/chain/network-hashrate",
    tag = "chain",
    params(("window" = Option<u64>, Query, description = "Averaging window in blocks")),
    responses(
        (status = 200, description = "Hashrate estimate", body = NetworkHashrateResponse),
        (status = 500, description = "Missing chain data", body = crate::error::ErrorResponse)
    )
)]
pub async fn network_hashrate(
    State(state): State<AppState>,
    Query(query): Query<NetworkHashrateQuery>,
) -> ApiResult<Json<NetworkHashrateResponse>> {
    let mut window = query.window.filter(|w| *w > 0).unwrap_or(120);

    let Some(head) = state.chain.head() else {
        return Ok(Json(NetworkHashrateResponse {
            hashrate: hex_u256(U256::zero()),
            window,
        }));
    };
    if head.number == 0 {
        return Ok(Json(NetworkHashrateResponse {
            hashrate: hex_u256(U256::zero()),
            window,
        }));
    }
    if window > head.number {
        window = head.number;
    }

    let base = state
        .chain
        .header_by_number(head.number - window)
        .ok_or_else(|| ApiError::Internal("could not load base block".into()))?;
    let td_head = state
        .chain
        .td(head.hash(), head.number)
        .ok_or_else(|| ApiError::Internal("missing total difficulty data".into()))?;
    let td_base = state
        .chain
        .td(base.hash(), base.number)
        .ok_or_else(|| ApiError::Internal("missing total difficulty data".into()))?;

    let elapsed = head.time.saturating_sub(base.time);
    if elapsed == 0 || td_head <= td_base {
        return Ok(Json(NetworkHashrateResponse {
            hashrate: hex_u256(U256::zero()),
            window,
        }));
    }
    let hashrate = (td_head - td_base) / U256::from(elapsed);
    Ok(Json(NetworkHashrateResponse {
        hashrate: hex_u256(hashrate),
        window,
    }))
}
