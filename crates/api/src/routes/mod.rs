pub mod breakdowns;
pub mod graphs;
pub mod health;
pub mod series;
pub mod summary;

use axum::Router;
use serde_json::Value;

use rugscope_common::types::QueryParams;

use crate::state::AppState;

/// Build the complete API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(graphs::router())
        .merge(series::router())
        .merge(breakdowns::router())
        .merge(summary::router())
        .with_state(state)
}

/// Build a provider parameter map from optional request filters.
///
/// Absent filters are omitted entirely — the resolved query then runs
/// unfiltered rather than erroring.
fn filter_params(entries: impl IntoIterator<Item = (&'static str, Option<Value>)>) -> QueryParams {
    let mut params = QueryParams::new();
    for (key, value) in entries {
        if let Some(value) = value {
            params.insert(key.to_string(), value);
        }
    }
    params
}
