//! RugScope API server binary entrypoint.

use std::net::SocketAddr;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use rugscope_common::config::AppConfig;
use rugscope_engine::service::AnalyticsService;

use rugscope_api::routes::create_router;
use rugscope_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "rugscope_api=debug,rugscope_engine=debug,rugscope_provider=debug,tower_http=debug",
            )
        }))
        .init();

    tracing::info!("Starting RugScope API server...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Build the analytics pipeline (provider client + catalog + cache)
    let analytics = AnalyticsService::from_config(&config);
    tracing::info!(provider = %config.provider_base_url, "Query provider client ready");

    // Build application state
    let port = config.port;
    let state = AppState::new(analytics, config);

    // Build router
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
