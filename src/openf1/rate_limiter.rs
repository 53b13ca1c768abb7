//! Token bucket rate limiter for OpenF1 requests.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::config::OpenF1Config;

/// Token bucket rate limiter with a jittered pause between requests
#[derive(Clone)]
pub struct RateLimiter {
    bucket: Arc<Mutex<Bucket>>,
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
    capacity: f64,
    /// Tokens per second
    refill_rate: f64,
    min_delay: Duration,
    max_delay: Duration,
}

impl Bucket {
    /// Take one token at `now` and return how long the caller must wait.
    ///
    /// `jitter` in [0, 1) picks a point between the minimum and maximum pause.
    fn reserve(&mut self, now: Instant, jitter: f64) -> Duration {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            let spread = self.max_delay.saturating_sub(self.min_delay);
            self.min_delay + spread.mul_f64(jitter.clamp(0.0, 1.0))
        } else {
            let wait = (1.0 - self.tokens) / self.refill_rate;
            self.tokens = 0.0;
            Duration::from_secs_f64(wait) + self.min_delay
        }
    }
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Arguments
    /// * `requests_per_minute` - Bucket capacity and refill rate
    /// * `min_delay_secs` - Minimum pause before each request
    /// * `max_delay_secs` - Maximum pause before each request while tokens remain
    pub fn new(requests_per_minute: u32, min_delay_secs: f64, max_delay_secs: f64) -> Self {
        let capacity = requests_per_minute.max(1) as f64;
        let min_delay = Duration::from_secs_f64(min_delay_secs.max(0.0));
        let max_delay = Duration::from_secs_f64(max_delay_secs.max(0.0)).max(min_delay);

        Self {
            bucket: Arc::new(Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
                capacity,
                refill_rate: capacity / 60.0,
                min_delay,
                max_delay,
            })),
        }
    }

    pub fn from_config(config: &OpenF1Config) -> Self {
        Self::new(
            config.requests_per_minute,
            config.min_delay_secs,
            config.max_delay_secs,
        )
    }

    /// Acquire a token, waiting if necessary
    pub async fn acquire(&self) {
        let delay = {
            let mut bucket = self.bucket.lock().await;
            bucket.reserve(Instant::now(), jitter())
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Pseudo-random factor in [0, 1) from the clock's sub-second nanos
fn jitter() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    (nanos % 1000) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(capacity: f64, min_ms: u64, max_ms: u64) -> Bucket {
        Bucket {
            tokens: capacity,
            last_refill: Instant::now(),
            capacity,
            refill_rate: capacity / 60.0,
            min_delay: Duration::from_millis(min_ms),
            max_delay: Duration::from_millis(max_ms),
        }
    }

    #[test]
    fn test_jittered_delay_within_bounds() {
        let mut b = bucket(10.0, 100, 300);
        let now = b.last_refill;
        assert_eq!(b.reserve(now, 0.0), Duration::from_millis(100));
        assert_eq!(b.reserve(now, 0.5), Duration::from_millis(200));
        assert!(b.reserve(now, 0.999) < Duration::from_millis(300));
    }

    #[test]
    fn test_empty_bucket_waits_for_refill() {
        // 60 per minute refills one token per second
        let mut b = bucket(60.0, 0, 0);
        b.tokens = 0.0;
        let now = b.last_refill;
        assert_eq!(b.reserve(now, 0.0), Duration::from_secs(1));
        assert_eq!(b.tokens, 0.0);
    }

    #[test]
    fn test_refill_is_capped() {
        let mut b = bucket(2.0, 0, 0);
        let later = b.last_refill + Duration::from_secs(3600);
        b.reserve(later, 0.0);
        assert!(b.tokens <= 1.0);
    }

    #[tokio::test]
    async fn test_acquire_without_delay_returns() {
        let limiter = RateLimiter::new(600, 0.0, 0.0);
        limiter.acquire().await;
        limiter.acquire().await;
    }
}
