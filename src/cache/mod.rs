//! Cache-aside layer for movie metadata
//!
//! `CacheBackend` is the byte-level seam with two implementations:
//!
//! - `RedisCache`: shared cache, pipelined batch reads/writes
//! - `MemoryCache`: in-process DashMap, used without Redis and in tests
//!
//! Every read that hits refreshes that key's TTL (sliding expiration).
//! `CacheService` layers JSON (de)serialization, a default TTL and retry on
//! top of a backend.

mod memory;
mod redis_cache;

pub use self::memory::{spawn_cleanup_task, MemoryCache, MemoryCacheStats};
pub use self::redis_cache::RedisCache;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::types::{ProfileError, Result};

/// Byte-level cache with per-key TTL
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get one value, resetting its TTL to `ttl` on hit
    async fn get(&self, key: &str, ttl: Duration) -> Result<Option<Vec<u8>>>;

    /// Store one value with TTL
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Get many values in one round trip, in key order, refreshing hits
    async fn get_many(&self, keys: &[String], ttl: Duration) -> Result<Vec<Option<Vec<u8>>>>;

    /// Store many values in one round trip
    async fn set_many(&self, entries: Vec<(String, Vec<u8>)>, ttl: Duration) -> Result<()>;
}

/// Typed JSON cache over a backend
#[derive(Clone)]
pub struct CacheService {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
    retry: RetryPolicy,
}

impl CacheService {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration, retry: RetryPolicy) -> Self {
        Self {
            backend,
            ttl,
            retry,
        }
    }

    /// Default TTL applied to writes and hit refreshes
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn store_single<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| ProfileError::Internal(format!("Cache encode failed: {}", e)))?;
        let ttl = ttl.unwrap_or(self.ttl);

        retry_with_backoff(&self.retry, "cache.set", || {
            self.backend.set(key, bytes.clone(), ttl)
        })
        .await
    }

    pub async fn store_many<T: Serialize>(
        &self,
        values: &HashMap<String, T>,
        ttl: Option<Duration>,
    ) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }

        let entries = values
            .iter()
            .map(|(key, value)| {
                serde_json::to_vec(value)
                    .map(|bytes| (key.clone(), bytes))
                    .map_err(|e| ProfileError::Internal(format!("Cache encode failed: {}", e)))
            })
            .collect::<Result<Vec<_>>>()?;
        let ttl = ttl.unwrap_or(self.ttl);

        debug!(count = entries.len(), "Writing cache entries");
        retry_with_backoff(&self.retry, "cache.set_many", || {
            self.backend.set_many(entries.clone(), ttl)
        })
        .await
    }

    pub async fn get_single<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw = retry_with_backoff(&self.retry, "cache.get", || {
            self.backend.get(key, self.ttl)
        })
        .await?;

        Ok(raw.and_then(|bytes| decode(key, &bytes)))
    }

    /// Look up several keys; every requested key is present in the result
    pub async fn get_many<T: DeserializeOwned>(
        &self,
        keys: &[String],
    ) -> Result<HashMap<String, Option<T>>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let raw = retry_with_backoff(&self.retry, "cache.get_many", || {
            self.backend.get_many(keys, self.ttl)
        })
        .await?;

        Ok(keys
            .iter()
            .cloned()
            .zip(raw.into_iter().chain(std::iter::repeat(None)))
            .map(|(key, bytes)| {
                let value = bytes.and_then(|b| decode(&key, &b));
                (key, value)
            })
            .collect())
    }
}

/// Undecodable entries count as misses
fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Option<T> {
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key = key, error = %e, "Discarding undecodable cache entry");
            None
        }
    }
}
