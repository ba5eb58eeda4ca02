//! Time-series visualizations: anomalies, sell-off patterns, post-rug view.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use rugscope_common::error::QueryError;
use rugscope_common::types::NormalizedResult;

use super::filter_params;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/anomaly-detection", get(anomaly_detection))
        .route("/api/sell-off-patterns", get(sell_off_patterns))
        .route("/api/post-rug-indicators", get(post_rug_indicators))
}

fn default_anomaly_days() -> u32 {
    14
}

fn default_sell_off_days() -> u32 {
    7
}

#[derive(Debug, Deserialize)]
struct AnomalyFilter {
    token_address: Option<String>,
    #[serde(default = "default_anomaly_days")]
    days: u32,
}

#[derive(Debug, Deserialize)]
struct SellOffFilter {
    token_address: Option<String>,
    #[serde(default = "default_sell_off_days")]
    days: u32,
}

#[derive(Debug, Deserialize)]
struct TokenFilter {
    token_address: Option<String>,
}

/// GET /api/anomaly-detection — daily volume with flagged spikes/drops.
async fn anomaly_detection(
    State(state): State<AppState>,
    Query(filter): Query<AnomalyFilter>,
) -> Result<Json<NormalizedResult>, QueryError> {
    let params = filter_params([
        ("token_address", filter.token_address.map(|t| json!(t))),
        ("days", Some(json!(filter.days))),
    ]);
    let result = state.analytics.query("anomaly_detection", params).await?;
    Ok(Json(result))
}

/// GET /api/sell-off-patterns — whale balance trajectories over the window.
async fn sell_off_patterns(
    State(state): State<AppState>,
    Query(filter): Query<SellOffFilter>,
) -> Result<Json<NormalizedResult>, QueryError> {
    let params = filter_params([
        ("token_address", filter.token_address.map(|t| json!(t))),
        ("days", Some(json!(filter.days))),
    ]);
    let result = state.analytics.query("sell_off_patterns", params).await?;
    Ok(Json(result))
}

/// GET /api/post-rug-indicators — LP pull plus price/activity collapse.
async fn post_rug_indicators(
    State(state): State<AppState>,
    Query(filter): Query<TokenFilter>,
) -> Result<Json<NormalizedResult>, QueryError> {
    let params = filter_params([("token_address", filter.token_address.map(|t| json!(t)))]);
    let result = state.analytics.query("post_rug_indicators", params).await?;
    Ok(Json(result))
}
