//! Bounded exponential backoff for remote writes.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use folio_core::{defaults, Error, Result};

/// Retry policy for transient remote failures.
///
/// Only [`Error::TransientRemote`] is retried; every other error returns
/// immediately. Delay doubles per attempt, except when the store supplied an
/// explicit retry-after hint, which takes precedence.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, counting the first.
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles each attempt after.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::RETRY_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(defaults::RETRY_BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Run `attempt_fn` until it succeeds, fails permanently, or the attempt
    /// ceiling is reached. The last transient error is returned on
    /// exhaustion, for the caller to record.
    pub async fn run<T, F, Fut>(&self, op: &str, mut attempt_fn: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match attempt_fn().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && attempt < self.max_attempts => {
                    let delay = match &error {
                        Error::TransientRemote {
                            retry_after: Some(hint),
                            ..
                        } => *hint,
                        _ => self.base_delay * 2u32.pow(attempt - 1),
                    };
                    warn!(
                        op,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        %error,
                        "transient remote failure, backing off"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let calls = AtomicU32::new(0);
        let result = fast_policy()
            .run("op", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, Error>(7) }
            })
            .await
            .unwrap();
        assert_eq!(result, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried() {
        let calls = AtomicU32::new(0);
        let result = fast_policy()
            .run("op", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(Error::transient("server error"))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_transient_error() {
        let calls = AtomicU32::new(0);
        let err = fast_policy()
            .run("op", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(Error::transient("still down")) }
            })
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let err = fast_policy()
            .run("op", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(Error::PermanentRemote("schema mismatch".into())) }
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PermanentRemote(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_doubles_per_attempt() {
        let start = Instant::now();
        let _ = fast_policy()
            .run("op", || async { Err::<(), _>(Error::transient("down")) })
            .await;
        // 100ms after attempt 1, 200ms after attempt 2.
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_hint_takes_precedence() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();
        let result = fast_policy()
            .run("op", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(Error::transient_after("rate limited", Duration::from_secs(5)))
                    } else {
                        Ok(1)
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(result, 1);
        assert!(start.elapsed() >= Duration::from_secs(5));
    }
}
