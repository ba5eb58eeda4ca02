use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// API key for the query provider (sent as `x-dune-api-key`)
    pub provider_api_key: String,

    /// Base URL of the query provider API
    pub provider_base_url: String,

    /// Result cache time-to-live in seconds (default: 3600)
    pub cache_ttl_seconds: u64,

    /// Wait between execution-status polls in milliseconds (default: 2000)
    pub poll_interval_ms: u64,

    /// Maximum number of status polls before giving up (default: 10)
    pub max_poll_attempts: u32,

    /// HTTP listen port (default: 3000)
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            provider_api_key: std::env::var("PROVIDER_API_KEY")
                .map_err(|_| anyhow::anyhow!("PROVIDER_API_KEY environment variable is required"))?,
            provider_base_url: std::env::var("PROVIDER_BASE_URL")
                .unwrap_or_else(|_| "https://api.dune.com/api/v1".to_string()),
            cache_ttl_seconds: std::env::var("CACHE_TTL_SECONDS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("CACHE_TTL_SECONDS must be a valid u64"))?,
            poll_interval_ms: std::env::var("POLL_INTERVAL_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("POLL_INTERVAL_MS must be a valid u64"))?,
            max_poll_attempts: std::env::var("MAX_POLL_ATTEMPTS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("MAX_POLL_ATTEMPTS must be a valid u32"))?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid u16"))?,
        })
    }
}
