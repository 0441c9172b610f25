//! OpenAPI document.

use crate::error::ErrorResponse;
use crate::handlers::{chain, engine};
use utoipa::OpenApi;

/// The API document served to tooling.
#[derive(OpenApi)]
#[openapi(
    paths(
        engine::get_work,
        engine::get_work_for,
        engine::submit_work,
        engine::submit_work_for,
        engine::get_hashrate,
        engine::submit_hashrate,
        engine::submit_hashrate_for,
        engine::gateway_stats,
        chain::runtime_config,
        chain::finalized_height,
        chain::supply,
        chain::network_hashrate,
    ),
    components(schemas(
        ErrorResponse,
        engine::WorkResponse,
        engine::SubmitWorkRequest,
        engine::AcceptedResponse,
        engine::HashrateRequest,
        engine::HashrateResponse,
        engine::MinerStatResponse,
        engine::GatewayStatsResponse,
        chain::RuntimeConfigResponse,
        chain::FinalizedHeightResponse,
        chain::SupplyResponse,
        chain::NetworkHashrateResponse,
    )),
    tags(
        (name = "engine", description = "Mining work and hashrate endpoints"),
        (name = "chain", description = "Chain information endpoints")
    )
)]
pub struct ApiDoc;
