//! Token bucket admission control
//!
//! One bucket per process guards every inbound request. The bucket starts
//! full with `capacity` tokens and refills continuously at `rate` tokens per
//! second; each admitted request consumes one token. Refill happens lazily
//! on each acquire, so no background task is needed.

use std::sync::Mutex;
use std::time::Instant;

/// Default burst size
pub const DEFAULT_CAPACITY: u32 = 10;

/// Default refill rate in tokens per second
pub const DEFAULT_RATE: f64 = 1.0;

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Single-process token bucket
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    rate: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(capacity: u32, rate: f64) -> Self {
        Self::new_at(capacity, rate, Instant::now())
    }

    fn new_at(capacity: u32, rate: f64, now: Instant) -> Self {
        Self {
            capacity: capacity as f64,
            rate,
            state: Mutex::new(BucketState {
                tokens: capacity as f64,
                last_refill: now,
            }),
        }
    }

    /// Try to take one token; false when the bucket is empty
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// `try_acquire` against an explicit clock reading
    pub fn try_acquire_at(&self, now: Instant) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rate).min(self.capacity);
        state.last_refill = now.max(state.last_refill);

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Tokens currently in the bucket, without refilling
    pub fn available(&self) -> f64 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).tokens
    }

    pub fn capacity(&self) -> u32 {
        self.capacity as u32
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl Default for TokenBucket {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_burst_then_reject() {
        let start = Instant::now();
        let bucket = TokenBucket::new_at(3, 1.0, start);

        assert!(bucket.try_acquire_at(start));
        assert!(bucket.try_acquire_at(start));
        assert!(bucket.try_acquire_at(start));
        assert!(!bucket.try_acquire_at(start));
    }

    #[test]
    fn test_refill_over_time() {
        let start = Instant::now();
        let bucket = TokenBucket::new_at(2, 2.0, start);

        assert!(bucket.try_acquire_at(start));
        assert!(bucket.try_acquire_at(start));
        assert!(!bucket.try_acquire_at(start));

        // Half a second at 2 tokens/sec buys exactly one request
        let later = start + Duration::from_millis(500);
        assert!(bucket.try_acquire_at(later));
        assert!(!bucket.try_acquire_at(later));
    }

    #[test]
    fn test_refill_capped_at_capacity() {
        let start = Instant::now();
        let bucket = TokenBucket::new_at(2, 100.0, start);

        let much_later = start + Duration::from_secs(60);
        assert!(bucket.try_acquire_at(much_later));
        assert!(bucket.try_acquire_at(much_later));
        assert!(!bucket.try_acquire_at(much_later));
    }

    #[test]
    fn test_partial_tokens_accumulate() {
        let start = Instant::now();
        let bucket = TokenBucket::new_at(1, 1.0, start);
        assert!(bucket.try_acquire_at(start));

        assert!(!bucket.try_acquire_at(start + Duration::from_millis(400)));
        assert!(!bucket.try_acquire_at(start + Duration::from_millis(800)));
        assert!(bucket.try_acquire_at(start + Duration::from_millis(1100)));
    }

    #[test]
    fn test_defaults() {
        let bucket = TokenBucket::default();
        assert_eq!(bucket.capacity(), 10);
        assert_eq!(bucket.rate(), 1.0);
        assert_eq!(bucket.available(), 10.0);
    }
}
