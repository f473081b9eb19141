//! In-process cache backend
//!
//! DashMap keyed by cache key. Entries carry their own expiry instant; a
//! hit pushes the expiry out by the caller's TTL. When full, the oldest
//! inserted entries are evicted first.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::CacheBackend;
use crate::types::Result;

struct Entry {
    data: Vec<u8>,
    inserted_at: Instant,
    expires_at: Instant,
}

/// Hit/miss counters for the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct MemoryCacheStats {
    pub entries: usize,
    pub max_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// DashMap-backed cache with TTL and max-entries eviction
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    fn get_refreshing(&self, key: &str, ttl: Duration, now: Instant) -> Option<Vec<u8>> {
        if let Some(mut entry) = self.entries.get_mut(key) {
            if now < entry.expires_at {
                entry.expires_at = now + ttl;
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.data.clone());
            }
            drop(entry);
            self.entries.remove(key);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    fn insert(&self, key: String, data: Vec<u8>, ttl: Duration, now: Instant) {
        if !self.entries.contains_key(&key) {
            self.evict_until_fits(1);
        }

        self.entries.insert(
            key,
            Entry {
                data,
                inserted_at: now,
                expires_at: now + ttl,
            },
        );
    }

    /// Evict oldest entries until `incoming` more fit
    fn evict_until_fits(&self, incoming: usize) {
        let current = self.entries.len();
        if current + incoming <= self.max_entries {
            return;
        }

        let to_evict = current + incoming - self.max_entries;

        let mut by_age: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.inserted_at))
            .collect();
        by_age.sort_by_key(|(_, inserted_at)| *inserted_at);

        let mut evicted = 0;
        for (key, _) in by_age.into_iter().take(to_evict) {
            if self.entries.remove(&key).is_some() {
                evicted += 1;
            }
        }

        self.evictions.fetch_add(evicted, Ordering::Relaxed);
        debug!(evicted = evicted, "Evicted cache entries to make space");
    }

    /// Drop expired entries; returns how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now < entry.expires_at);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> MemoryCacheStats {
        MemoryCacheStats {
            entries: self.entries.len(),
            max_entries: self.max_entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str, ttl: Duration) -> Result<Option<Vec<u8>>> {
        Ok(self.get_refreshing(key, ttl, Instant::now()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        self.insert(key.to_string(), value, ttl, Instant::now());
        Ok(())
    }

    async fn get_many(&self, keys: &[String], ttl: Duration) -> Result<Vec<Option<Vec<u8>>>> {
        let now = Instant::now();
        Ok(keys
            .iter()
            .map(|key| self.get_refreshing(key, ttl, now))
            .collect())
    }

    async fn set_many(&self, entries: Vec<(String, Vec<u8>)>, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        for (key, value) in entries {
            self.insert(key, value, ttl, now);
        }
        Ok(())
    }
}

/// Spawn a background task to periodically remove expired entries
pub fn spawn_cleanup_task(cache: Arc<MemoryCache>, interval: Duration) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let expired = cache.cleanup_expired();
            if expired > 0 {
                debug!(expired = expired, remaining = cache.len(), "Cache cleanup completed");
            }
        }
    });

    info!(interval_secs = interval.as_secs(), "Cache cleanup task started");
}
