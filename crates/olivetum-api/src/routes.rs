//! Route table.

use crate::handlers::{chain, engine};
use crate::AppState;
use axum::routing::{get, post};
use axum::Router;

/// Builds the API router over shared application state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/engine/work", get(engine::get_work))
        .route("/engine/work/:address", get(engine::get_work_for))
        .route("/engine/submit-work", post(engine::submit_work))
        .route("/engine/submit-work/:address", post(engine::submit_work_for))
        .route(
            "/engine/hashrate",
            get(engine::get_hashrate).post(engine::submit_hashrate),
        )
        .route("/engine/hashrate/:address", post(engine::submit_hashrate_for))
        .route("/engine/gateway/stats", get(engine::gateway_stats))
        .route("/chain/runtime-config", get(chain::runtime_config))
        .route("/chain/finalized-height", get(chain::finalized_height))
        .route("/chain/supply", get(chain::supply))
        .route("/chain/network-hashrate", get(chain::network_hashrate))
        .with_state(state)
}
