//! Result cache — single-flight memoization of completed query results.
//!
//! Provider executions are the expensive, rate-limited resource in this
//! system, so concurrent requests for the same (query, parameters) key must
//! never trigger duplicate submissions: the first caller starts the
//! computation, later callers wait on its outcome over a broadcast channel.
//!
//! The computation runs in a spawned task. If the HTTP request that started
//! it is abandoned, only the waiting side is dropped; the execution still
//! completes and its result populates the cache for the next caller.
//!
//! Entries expire after their TTL and are evicted lazily on the next lookup.
//! Failed computations are never cached.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, broadcast};
use tokio::time::Instant;

use rugscope_common::error::QueryError;
use rugscope_common::types::{NormalizedResult, QueryParams, canonical_params};

/// Cache key: logical query name plus the canonical parameter encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    name: String,
    params: String,
}

impl CacheKey {
    pub fn new(logical_name: &str, params: &QueryParams) -> Self {
        Self {
            name: logical_name.to_string(),
            params: canonical_params(params),
        }
    }
}

struct CacheEntry {
    value: NormalizedResult,
    expires_at: Instant,
}

type Outcome = Result<NormalizedResult, QueryError>;

#[derive(Default)]
struct CacheInner {
    entries: HashMap<CacheKey, CacheEntry>,
    in_flight: HashMap<CacheKey, broadcast::Sender<Outcome>>,
}

/// Shared, mutable result cache with per-key single-flight computation.
#[derive(Clone, Default)]
pub struct ResultCache {
    inner: Arc<Mutex<CacheInner>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, or run `compute` to produce it.
    ///
    /// At most one computation runs per key at a time; concurrent callers
    /// for the same key wait on the in-flight one.
    pub async fn get_or_compute<F, Fut>(&self, key: CacheKey, ttl: Duration, compute: F) -> Outcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        let mut rx = {
            let mut inner = self.inner.lock().await;

            if let Some(entry) = inner.entries.get(&key) {
                if Instant::now() < entry.expires_at {
                    tracing::debug!(query = %key.name, "Result cache hit");
                    return Ok(entry.value.clone());
                }
                // Expired; superseded by whatever the recompute produces.
                inner.entries.remove(&key);
            }

            if let Some(tx) = inner.in_flight.get(&key) {
                tracing::debug!(query = %key.name, "Joining in-flight computation");
                tx.subscribe()
            } else {
                let (tx, rx) = broadcast::channel(1);
                inner.in_flight.insert(key.clone(), tx);

                let cache = Arc::clone(&self.inner);
                let task_key = key.clone();
                let fut = compute();
                tokio::spawn(async move {
                    let outcome = fut.await;

                    let mut inner = cache.lock().await;
                    let tx = inner.in_flight.remove(&task_key);
                    if let Ok(value) = &outcome {
                        inner.entries.insert(
                            task_key,
                            CacheEntry {
                                value: value.clone(),
                                expires_at: Instant::now() + ttl,
                            },
                        );
                    }
                    if let Some(tx) = tx {
                        // All waiters may have gone away; the entry above
                        // still serves the next caller.
                        let _ = tx.send(outcome);
                    }
                });

                rx
            }
        };

        match rx.recv().await {
            Ok(outcome) => outcome,
            Err(_) => Err(QueryError::Transport(
                "in-flight computation terminated without a result".to_string(),
            )),
        }
    }
}
