//! Configuration for the profile service
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// User id served when auth is disabled
pub const DEFAULT_DEV_USER_ID: &str = "2f384bd0-97a7-45e1-9f9f-da79affa8048";

/// Movie metadata stays cached for a week after its last read
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60 * 60 * 24 * 7;

/// UGC profile service - bookmarks, likes, reviews and watch progress
#[derive(Parser, Debug, Clone)]
#[command(name = "ugc-profile")]
#[command(about = "Profile service for user-generated content")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,

    /// Prefix for all API routes
    #[arg(long, env = "API_PATH", default_value = "/api/v1")]
    pub api_path: String,

    /// Enable development mode (tolerates missing NATS/Redis)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Production mode requires an X-Request-Id header on every request
    #[arg(long, env = "PRODUCTION_MODE", default_value = "false")]
    pub production_mode: bool,

    /// NATS configuration
    #[command(flatten)]
    pub nats: NatsArgs,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "moviesUGC")]
    pub mongodb_db: String,

    /// Redis URL for the movie metadata cache; in-process cache when unset
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Movie metadata cache TTL in seconds
    #[arg(long, env = "CACHE_TTL_SECS", default_value_t = DEFAULT_CACHE_TTL_SECS)]
    pub cache_ttl_secs: u64,

    /// Maximum entries held by the in-process cache
    #[arg(long, env = "CACHE_MAX_ENTRIES", default_value = "10000")]
    pub cache_max_entries: usize,

    /// Base URL of the movie content service
    #[arg(long, env = "MOVIE_API_URL", default_value = "http://localhost:8001/api/v1")]
    pub movie_api_url: String,

    /// Auth service endpoint returning the current user
    #[arg(long, env = "AUTH_URL", default_value = "http://localhost:8000/api/v1/users/me")]
    pub auth_url: String,

    /// Validate bearer tokens against the auth service
    #[arg(long, env = "AUTH_ENABLED", default_value = "false")]
    pub auth_enabled: bool,

    /// User id assumed for every request while auth is disabled
    #[arg(long, env = "DEV_USER_ID", default_value = DEFAULT_DEV_USER_ID)]
    pub dev_user_id: String,

    /// Token bucket capacity (burst size)
    #[arg(long, env = "TOKEN_BUCKET_CAPACITY", default_value = "10")]
    pub token_bucket_capacity: u32,

    /// Token bucket refill rate in tokens per second
    #[arg(long, env = "TOKEN_BUCKET_RATE", default_value = "1")]
    pub token_bucket_rate: f64,

    /// Maximum retry attempts for cache and upstream calls
    #[arg(long, env = "RETRY_MAX", default_value = "5")]
    pub retry_max: usize,

    /// Minimum backoff between retries in milliseconds
    #[arg(long, env = "RETRY_MIN_MS", default_value = "4000")]
    pub retry_min_ms: u64,

    /// Maximum backoff between retries in milliseconds
    #[arg(long, env = "RETRY_MAX_MS", default_value = "10000")]
    pub retry_max_ms: u64,

    /// Upstream HTTP request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "5000")]
    pub request_timeout_ms: u64,

    /// Largest request body accepted under the API prefix, in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "1048576")]
    pub max_body_bytes: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,
}

/// NATS connection configuration
#[derive(Parser, Debug, Clone)]
pub struct NatsArgs {
    /// NATS server URL
    #[arg(long, env = "NATS_URL", default_value = "nats://127.0.0.1:4222")]
    pub nats_url: String,

    /// NATS username (optional)
    #[arg(long, env = "NATS_USER")]
    pub nats_user: Option<String>,

    /// NATS password (optional)
    #[arg(long, env = "NATS_PASSWORD")]
    pub nats_password: Option<String>,

    /// Subject tree for UGC events
    #[arg(long, env = "UGC_SUBJECT", default_value = "ugc")]
    pub ugc_subject: String,

    /// Subject tree for watch progress events
    #[arg(long, env = "PROGRESS_SUBJECT", default_value = "view_progress")]
    pub progress_subject: String,

    /// Create JetStream streams for the subjects at startup
    #[arg(long, env = "ENSURE_STREAMS", default_value = "false")]
    pub ensure_streams: bool,
}

impl NatsArgs {
    /// All subject trees the service publishes to
    pub fn subjects(&self) -> [&str; 2] {
        [&self.ugc_subject, &self.progress_subject]
    }
}

impl Args {
    /// Cache TTL as a duration
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Upstream request timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Retry policy for cache and upstream calls
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_max,
            Duration::from_millis(self.retry_min_ms),
            Duration::from_millis(self.retry_max_ms),
            2.0,
        )
    }

    /// Whether a request path falls under the authenticated API
    pub fn is_api_path(&self, path: &str) -> bool {
        path.starts_with(&self.api_path)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.token_bucket_capacity == 0 {
            return Err("TOKEN_BUCKET_CAPACITY must be at least 1".to_string());
        }

        if !(self.token_bucket_rate > 0.0) {
            return Err("TOKEN_BUCKET_RATE must be positive".to_string());
        }

        if self.retry_min_ms > self.retry_max_ms {
            return Err("RETRY_MIN_MS must be less than or equal to RETRY_MAX_MS".to_string());
        }

        if self.max_body_bytes == 0 {
            return Err("MAX_BODY_BYTES must be at least 1".to_string());
        }

        if self.cache_ttl_secs == 0 {
            return Err("CACHE_TTL_SECS must be positive".to_string());
        }

        if !self.api_path.starts_with('/') {
            return Err("API_PATH must start with '/'".to_string());
        }

        if self.auth_enabled && self.auth_url.is_empty() {
            return Err("AUTH_URL is required when AUTH_ENABLED is set".to_string());
        }

        Ok(())
    }
}
