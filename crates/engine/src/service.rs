//! Analytics service — the pipeline behind every visualization endpoint.
//!
//! resolve → cache lookup → on miss, provider execution → normalize.

use std::sync::Arc;
use std::time::Duration;

use rugscope_common::config::AppConfig;
use rugscope_common::error::QueryError;
use rugscope_common::types::{NormalizedResult, QueryParams};
use rugscope_provider::ProviderClient;

use crate::cache::{CacheKey, ResultCache};
use crate::catalog::Catalog;
use crate::normalize;

pub struct AnalyticsService {
    catalog: Catalog,
    client: Arc<ProviderClient>,
    cache: ResultCache,
    ttl: Duration,
}

impl AnalyticsService {
    pub fn new(client: ProviderClient, ttl: Duration) -> Self {
        Self {
            catalog: Catalog::new(),
            client: Arc::new(client),
            cache: ResultCache::new(),
            ttl,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            ProviderClient::from_config(config),
            Duration::from_secs(config.cache_ttl_seconds),
        )
    }

    /// Run a logical query and return its normalized result.
    ///
    /// Results are memoized per (query, parameters) for the configured TTL;
    /// a cache miss drives the provider's submit/poll/fetch protocol.
    pub async fn query(
        &self,
        logical_name: &str,
        params: QueryParams,
    ) -> Result<NormalizedResult, QueryError> {
        let def = self.catalog.resolve(logical_name)?;
        let key = CacheKey::new(logical_name, &params);

        let client = Arc::clone(&self.client);
        let name = logical_name.to_string();
        self.cache
            .get_or_compute(key, self.ttl, move || async move {
                tracing::info!(query = %name, query_id = def.query_id, "Executing provider query");
                let raw = client.execute(def.query_id, &params).await?;
                Ok(normalize::apply(def.shape, &raw, &params))
            })
            .await
    }
}
