//! Retry with exponential backoff
//!
//! Wraps cache and upstream calls. Only errors reporting
//! `ProfileError::is_transient` are retried.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::types::ProfileError;

/// Backoff configuration
///
/// ```text
/// backoff(n) = clamp(initial_backoff * multiplier^n, initial_backoff, max_backoff)
///
/// With the service defaults (4s initial, 2x, 10s max):
/// - retry 1: 4s
/// - retry 2: 8s
/// - retry 3+: 10s
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first call
    pub max_retries: usize,

    pub initial_backoff: Duration,

    pub max_backoff: Duration,

    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff: Duration::from_secs(4),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(
        max_retries: usize,
        initial_backoff: Duration,
        max_backoff: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_retries,
            initial_backoff,
            max_backoff,
            backoff_multiplier,
        }
    }

    /// A policy that never retries
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO, 1.0)
    }

    /// Backoff before retry `attempt` (0-indexed)
    pub fn backoff(&self, attempt: usize) -> Duration {
        let backoff_ms = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let backoff = Duration::from_millis(backoff_ms as u64);
        backoff.clamp(self.initial_backoff, self.max_backoff.max(self.initial_backoff))
    }
}

/// Run `operation`, retrying transient failures with backoff
///
/// Returns the first success, the first non-transient error, or the last
/// error once `max_retries` is exhausted.
pub async fn retry_with_backoff<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, ProfileError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProfileError>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if !err.is_transient() {
                    return Err(err);
                }

                if attempt >= policy.max_retries {
                    warn!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        max_retries = policy.max_retries,
                        error = %err,
                        "Max retries exhausted, giving up"
                    );
                    return Err(err);
                }

                let backoff = policy.backoff(attempt);
                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "Transient error, backing off"
                );

                sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}
