//! Dashboard summary endpoint.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use rugscope_common::error::QueryError;
use rugscope_common::types::{NormalizedResult, QueryParams};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/dashboard-summary", get(dashboard_summary))
}

/// GET /api/dashboard-summary — top-line metrics for the dashboard header.
async fn dashboard_summary(
    State(state): State<AppState>,
) -> Result<Json<NormalizedResult>, QueryError> {
    let result = state
        .analytics
        .query("dashboard_summary", QueryParams::new())
        .await?;
    Ok(Json(result))
}
