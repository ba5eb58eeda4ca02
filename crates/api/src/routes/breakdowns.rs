//! Distribution visualizations: ownership, volume brackets, bot share.

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
        .route("/api/ownership-concentration", get(ownership_concentration))
        .route("/api/volume-brackets", get(volume_brackets))
        .route("/api/bot-volume", get(bot_volume))
}

fn default_bracket_days() -> u32 {
    30
}

#[derive(Debug, Deserialize)]
struct TokenFilter {
    token_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BracketFilter {
    launchpad: Option<String>,
    #[serde(default = "default_bracket_days")]
    days: u32,
}

/// GET /api/ownership-concentration — per-holder supply share.
async fn ownership_concentration(
    State(state): State<AppState>,
    Query(filter): Query<TokenFilter>,
) -> Result<Json<NormalizedResult>, QueryError> {
    let params = filter_params([("token_address", filter.token_address.map(|t| json!(t)))]);
    let result = state
        .analytics
        .query("ownership_concentration", params)
        .await?;
    Ok(Json(result))
}

/// GET /api/volume-brackets — trade counts per volume bracket for a launchpad.
async fn volume_brackets(
    State(state): State<AppState>,
    Query(filter): Query<BracketFilter>,
) -> Result<Json<NormalizedResult>, QueryError> {
    let params = filter_params([
        ("launchpad", filter.launchpad.map(|l| json!(l))),
        ("days", Some(json!(filter.days))),
    ]);
    let result = state.analytics.query("volume_brackets", params).await?;
    Ok(Json(result))
}

/// GET /api/bot-volume — bot vs. organic transaction share.
async fn bot_volume(
    State(state): State<AppState>,
    Query(filter): Query<TokenFilter>,
) -> Result<Json<NormalizedResult>, QueryError> {
    let params = filter_params([("token_address", filter.token_address.map(|t| json!(t)))]);
    let result = state.analytics.query("bot_volume", params).await?;
    Ok(Json(result))
}
