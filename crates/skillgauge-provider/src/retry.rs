use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::ProviderError;

const BASE_BACKOFF_SECS: u64 = 1;

/// Bounded retry with per-call timeout and exponential backoff.
///
/// `max_retries` counts retries after the first attempt, so the total number
/// of attempts is `max_retries + 1`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Per-attempt timeout; an attempt that exceeds it counts as a failure.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, timeout: Duration) -> Self {
        Self {
            max_retries,
            timeout,
        }
    }

    fn backoff(attempt: u32) -> Duration {
        Duration::from_secs(BASE_BACKOFF_SECS << attempt)
    }

    /// Run `f` until it succeeds or the attempt budget is spent.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::ServiceUnreachable`] carrying the total
    /// attempt count and the last failure message once all attempts fail.
    pub async fn run<T, F, Fut>(&self, what: &str, mut f: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut last_error = String::new();

        for attempt in 0..=self.max_retries {
            match tokio::time::timeout(self.timeout, f()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => last_error = e.to_string(),
                Err(_) => {
                    last_error = ProviderError::Timeout {
                        timeout_secs: self.timeout.as_secs(),
                    }
                    .to_string();
                }
            }

            if attempt < self.max_retries {
                let delay = Self::backoff(attempt);
                warn!(
                    "{what} attempt {}/{} failed ({last_error}), retrying in {}s",
                    attempt + 1,
                    self.max_retries + 1,
                    delay.as_secs()
                );
                tokio::time::sleep(delay).await;
            }
        }

        Err(ProviderError::ServiceUnreachable {
            attempts: self.max_retries + 1,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn backoff_is_exponential() {
        assert_eq!(RetryPolicy::backoff(0), Duration::from_secs(1));
        assert_eq!(RetryPolicy::backoff(1), Duration::from_secs(2));
        assert_eq!(RetryPolicy::backoff(2), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn first_attempt_success_needs_no_retry() {
        let policy = RetryPolicy::new(3, Duration::from_secs(5));
        let calls = AtomicU32::new(0);

        let result = policy
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, ProviderError>(42) }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_then_success() {
        let policy = RetryPolicy::new(2, Duration::from_secs(5));
        let calls = AtomicU32::new(0);

        let result = policy
            .run("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(ProviderError::EmptyResponse)
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_attempts_surface_unreachable() {
        let policy = RetryPolicy::new(2, Duration::from_secs(5));
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ProviderError::EmptyResponse) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(ProviderError::ServiceUnreachable { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected ServiceUnreachable, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hung_call_counts_as_timeout() {
        let policy = RetryPolicy::new(1, Duration::from_secs(1));

        let result: Result<(), _> = policy
            .run("test", || async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            })
            .await;

        match result {
            Err(ProviderError::ServiceUnreachable { last_error, .. }) => {
                assert!(last_error.contains("timed out"), "got: {last_error}");
            }
            other => panic!("expected ServiceUnreachable, got {other:?}"),
        }
    }
}
