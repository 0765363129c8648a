//! Exponential-backoff retries

use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

use tokenagg_core::{SourceConfig, SourceError, SourceResult};

/// Retry budget for one upstream client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl From<&SourceConfig> for RetryPolicy {
    fn from(config: &SourceConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.base_retry_delay(),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (zero-based): base * 2^retry
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }

    /// Run `op` until it succeeds or the budget is spent.
    ///
    /// `Disabled` is never retried. On exhaustion the last error is wrapped
    /// in `RetriesExhausted`.
    pub async fn run<T, F, Fut>(&self, source_name: &'static str, mut op: F) -> SourceResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SourceResult<T>>,
    {
        let mut retry = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e @ SourceError::Disabled(_)) => return Err(e),
                Err(e) if retry >= self.max_retries => {
                    error!("{} request failed after {} attempts: {}", source_name, retry + 1, e);
                    return Err(SourceError::RetriesExhausted {
                        source_name,
                        attempts: retry + 1,
                        last_error: e.to_string(),
                    });
                }
                Err(e) => {
                    let delay = self.delay_for(retry);
                    warn!(
                        "{} request failed ({}), retrying in {:?} (attempt {}/{})",
                        source_name,
                        e,
                        delay,
                        retry + 1,
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let policy = RetryPolicy::default();
        let calls = &AtomicU32::new(0);
        let start = Instant::now();

        let result = policy
            .run("test", move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(SourceError::Request("connection reset".to_string()))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_budget() {
        let policy = RetryPolicy::default();
        let calls = &AtomicU32::new(0);

        let result: SourceResult<()> = policy
            .run("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(SourceError::Status { status: 503, body: String::new() })
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match result {
            Err(SourceError::RetriesExhausted { attempts, source_name, .. }) => {
                assert_eq!(attempts, 4);
                assert_eq!(source_name, "test");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_is_not_retried() {
        let policy = RetryPolicy::default();
        let calls = &AtomicU32::new(0);

        let result: SourceResult<()> = policy
            .run("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(SourceError::Disabled("test"))
            })
            .await;

        assert!(matches!(result, Err(SourceError::Disabled(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
