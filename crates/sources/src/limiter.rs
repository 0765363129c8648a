//! Minimum spacing between requests issued by one client

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Leaky bucket of one: each call waits until `min_interval` has passed
/// since the previous call on the same limiter.
#[derive(Debug)]
pub struct RateLimiter {
    name: &'static str,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(name: &'static str, min_interval: Duration) -> Self {
        Self {
            name,
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Wait if needed before making a request.
    ///
    /// The lock is held across the sleep so concurrent callers queue up
    /// behind each other instead of all waking at once.
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                debug!("Rate limiting {}: waiting {:?}", self.name, wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_first_call_does_not_wait() {
        let limiter = RateLimiter::new("test", Duration::from_millis(200));
        let start = Instant::now();

        limiter.wait().await;

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_calls_are_spaced() {
        let limiter = RateLimiter::new("test", Duration::from_millis(200));
        let start = Instant::now();

        limiter.wait().await;
        limiter.wait().await;
        limiter.wait().await;

        assert!(start.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_interval_elapsed() {
        let limiter = RateLimiter::new("test", Duration::from_millis(200));

        limiter.wait().await;
        tokio::time::sleep(Duration::from_millis(300)).await;

        let start = Instant::now();
        limiter.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_are_serialized() {
        let limiter = Arc::new(RateLimiter::new("test", Duration::from_millis(100)));
        let start = Instant::now();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.wait().await })
            })
            .collect();

        for h in handles {
            h.await.unwrap();
        }

        assert!(start.elapsed() >= Duration::from_millis(300));
    }
}
