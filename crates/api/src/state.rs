//! Shared application state for the Axum API server.

use std::sync::Arc;

use rugscope_common::config::AppConfig;
use rugscope_engine::service::AnalyticsService;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub analytics: Arc<AnalyticsService>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(analytics: AnalyticsService, config: AppConfig) -> Self {
        Self {
            analytics: Arc::new(analytics),
            config,
        }
    }
}
