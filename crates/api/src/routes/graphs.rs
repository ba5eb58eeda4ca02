//! Graph-shaped visualizations: transaction flow and wallet clustering.

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
        .route("/api/transaction-flow", get(transaction_flow))
        .route("/api/wallet-clustering", get(wallet_clustering))
}

#[derive(Debug, Deserialize)]
struct TokenFilter {
    token_address: Option<String>,
}

/// GET /api/transaction-flow — token transfer graph between wallets.
async fn transaction_flow(
    State(state): State<AppState>,
    Query(filter): Query<TokenFilter>,
) -> Result<Json<NormalizedResult>, QueryError> {
    let params = filter_params([("token_address", filter.token_address.map(|t| json!(t)))]);
    let result = state.analytics.query("transaction_flow", params).await?;
    Ok(Json(result))
}

/// GET /api/wallet-clustering — wallet clusters, links, and activity timeline.
async fn wallet_clustering(
    State(state): State<AppState>,
    Query(filter): Query<TokenFilter>,
) -> Result<Json<NormalizedResult>, QueryError> {
    let params = filter_params([("token_address", filter.token_address.map(|t| json!(t)))]);
    let result = state.analytics.query("wallet_clustering", params).await?;
    Ok(Json(result))
}
