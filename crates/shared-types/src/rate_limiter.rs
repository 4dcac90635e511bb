//! # Rate Limiter
//!
//! Token bucket guarding the raw-transaction replication pipe.
//!
//! ## Security
//!
//! A peer flooding `PUSH_TXS` messages would otherwise saturate the
//! pre-check queue shared with local submissions. Messages arriving while
//! the bucket is empty are dropped.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Token bucket rate limiter.
///
/// # Algorithm
///
/// - The bucket starts full with `burst` tokens
/// - Tokens are added at `limit` per second, capped at `burst`
/// - Each admitted message consumes one token
pub struct RateLimiter {
    /// Maximum tokens in bucket.
    burst: u64,
    /// Tokens to add per second.
    limit: u64,
    /// Current token count.
    tokens: AtomicU64,
    /// Last refill time.
    last_refill: Mutex<Instant>,
}

impl RateLimiter {
    /// Create a limiter refilling `limit` tokens per second up to `burst`.
    pub fn new(limit: u64, burst: u64) -> Self {
        Self {
            burst,
            limit,
            tokens: AtomicU64::new(burst),
            last_refill: Mutex::new(Instant::now()),
        }
    }

    /// Take a token if one is available.
    pub fn allow(&self) -> bool {
        self.refill();

        loop {
            let current = self.tokens.load(Ordering::Relaxed);
            if current == 0 {
                return false;
            }

            if self
                .tokens
                .compare_exchange(current, current - 1, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
        }
    }

    fn refill(&self) {
        let mut last = self.last_refill.lock();
        let now = Instant::now();
        let elapsed = now.duration_since(*last);

        let tokens_to_add = (elapsed.as_secs_f64() * self.limit as f64) as u64;
        if tokens_to_add == 0 {
            return;
        }
        *last = now;

        loop {
            let current = self.tokens.load(Ordering::Relaxed);
            let new_value = current.saturating_add(tokens_to_add).min(self.burst);

            if self
                .tokens
                .compare_exchange(current, new_value, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
            {
                break;
            }
        }
    }

    /// Tokens currently available.
    pub fn available(&self) -> u64 {
        self.refill();
        self.tokens.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_allows_up_to_burst() {
        let limiter = RateLimiter::new(1, 5);

        for _ in 0..5 {
            assert!(limiter.allow());
        }
    }

    #[test]
    fn test_drops_when_empty() {
        let limiter = RateLimiter::new(0, 3);

        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(!limiter.allow());
        assert_eq!(limiter.available(), 0);
    }

    #[test]
    fn test_refills_over_time() {
        let limiter = RateLimiter::new(100, 5);

        for _ in 0..5 {
            limiter.allow();
        }
        assert!(!limiter.allow());

        // 100ms at 100 tokens/sec adds ~10 tokens, capped at 5
        thread::sleep(Duration::from_millis(100));

        assert!(limiter.allow());
        assert!(limiter.available() <= 5);
    }
}
