//! Health check endpoint
//!
//! Liveness is always 200 while the process runs. `status` reports
//! `degraded` when MongoDB or NATS were replaced by their dev-mode
//! fallbacks at startup.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;

use super::{error_response, json_response};
use crate::cache::MemoryCacheStats;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    /// `online` or `degraded`
    pub status: &'static str,
    pub version: &'static str,
    pub commit: &'static str,
    pub built_at: &'static str,
    /// Uptime in seconds
    pub uptime: u64,
    pub timestamp: String,
    pub mode: &'static str,
    pub mongo_connected: bool,
    pub nats_connected: bool,
    pub cache: CacheHealth,
    pub rate_limit: RateLimitHealth,
}

#[derive(Debug, Serialize)]
pub struct CacheHealth {
    /// `redis` or `memory`
    pub backend: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<MemoryCacheStats>,
}

#[derive(Debug, Serialize)]
pub struct RateLimitHealth {
    pub capacity: u32,
    pub rate: f64,
    pub available: f64,
}

fn build_health_response(state: &AppState) -> HealthResponse {
    let degraded = !state.mongo_connected || !state.nats_connected;

    HealthResponse {
        healthy: true,
        status: if degraded { "degraded" } else { "online" },
        version: env!("CARGO_PKG_VERSION"),
        commit: env!("GIT_COMMIT_SHORT"),
        built_at: env!("BUILD_TIMESTAMP"),
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        mode: if state.args.dev_mode {
            "development"
        } else {
            "production"
        },
        mongo_connected: state.mongo_connected,
        nats_connected: state.nats_connected,
        cache: CacheHealth {
            backend: if state.memory_cache.is_some() {
                "memory"
            } else {
                "redis"
            },
            stats: state.memory_cache.as_ref().map(|c| c.stats()),
        },
        rate_limit: RateLimitHealth {
            capacity: state.limiter.capacity(),
            rate: state.limiter.rate(),
            available: state.limiter.available(),
        },
    }
}

/// GET /health
pub fn health_check(state: &AppState) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &build_health_response(state)).unwrap_or_else(|e| error_response(&e))
}
