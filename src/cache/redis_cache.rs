//! Redis cache backend
//!
//! Batch reads issue every GET in one pipeline, then refresh the TTL of the
//! hits in a second pipeline. Batch writes send all `SET EX` in one pipeline.
//! Single-key calls go through the same pipelines.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, Pipeline};
use std::time::Duration;
use tracing::{debug, info};

use super::CacheBackend;
use crate::types::{ProfileError, Result};

/// Shared cache on a Redis connection manager
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connect with a reconnecting connection manager
    pub async fn connect(redis_url: &str) -> Result<Self> {
        info!("Connecting to Redis at {}", redis_url);

        let client = Client::open(redis_url)
            .map_err(|e| ProfileError::Config(format!("Invalid Redis URL: {}", e)))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| ProfileError::Cache(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { conn })
    }
}

fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

/// One GET per key; replies come back in key order
fn read_pipeline(keys: &[String]) -> Pipeline {
    let mut pipe = redis::pipe();
    for key in keys {
        pipe.get(key);
    }
    pipe
}

/// EXPIRE for the keys that were hits, `None` when nothing was found
fn refresh_pipeline(keys: &[String], values: &[Option<Vec<u8>>], ttl: Duration) -> Option<Pipeline> {
    let mut pipe = redis::pipe();
    let mut hits = 0;
    for (key, value) in keys.iter().zip(values) {
        if value.is_some() {
            pipe.expire(key, ttl_secs(ttl) as i64).ignore();
            hits += 1;
        }
    }
    (hits > 0).then_some(pipe)
}

/// `SET key value EX ttl` for every entry
fn write_pipeline(entries: Vec<(String, Vec<u8>)>, ttl: Duration) -> Pipeline {
    let mut pipe = redis::pipe();
    for (key, value) in entries {
        pipe.cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_secs(ttl))
            .ignore();
    }
    pipe
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str, ttl: Duration) -> Result<Option<Vec<u8>>> {
        let values = self.get_many(&[key.to_string()], ttl).await?;
        Ok(values.into_iter().next().flatten())
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        self.set_many(vec![(key.to_string(), value)], ttl).await
    }

    async fn get_many(&self, keys: &[String], ttl: Duration) -> Result<Vec<Option<Vec<u8>>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.conn.clone();
        let values: Vec<Option<Vec<u8>>> = read_pipeline(keys).query_async(&mut conn).await?;
        if values.len() != keys.len() {
            return Err(ProfileError::Cache(format!(
                "Redis returned {} replies for {} keys",
                values.len(),
                keys.len()
            )));
        }

        if let Some(refresh) = refresh_pipeline(keys, &values, ttl) {
            let _: () = refresh.query_async(&mut conn).await?;
        }

        debug!(
            requested = keys.len(),
            hits = values.iter().filter(|v| v.is_some()).count(),
            "Redis batch read"
        );
        Ok(values)
    }

    async fn set_many(&self, entries: Vec<(String, Vec<u8>)>, ttl: Duration) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.clone();
        let _: () = write_pipeline(entries, ttl).query_async(&mut conn).await?;
        Ok(())
    }
}
