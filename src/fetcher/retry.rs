//! Retry loop around a [`Fetcher`]: bounded attempts with exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use crate::app::{ResolveError, Result};
use crate::config::FetchConfig;
use crate::fetcher::{FetchFailure, Fetcher};

/// Exponential backoff policy with caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Upper bound on a single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&FetchConfig::default())
    }
}

impl From<&FetchConfig> for RetryPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.retries.saturating_add(1),
            base_delay: Duration::from_millis(config.backoff_ms),
            max_delay: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt, or `None` to give up.
    ///
    /// `attempt` is 1-based (1 = the attempt that just failed).
    pub fn decide(&self, attempt: u32, failure: &FetchFailure) -> Option<Duration> {
        if attempt >= self.max_attempts || !failure.is_retryable() {
            return None;
        }
        let factor = 1u32 << attempt.saturating_sub(1).min(8);
        Some(self.base_delay.saturating_mul(factor).min(self.max_delay))
    }
}

/// Applies a [`RetryPolicy`] to every fetch and maps the final failure to
/// [`ResolveError::Fetch`].
#[derive(Clone)]
pub struct RetryingFetcher {
    inner: Arc<dyn Fetcher + Send + Sync>,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    pub fn new(inner: Arc<dyn Fetcher + Send + Sync>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub async fn get(&self, url: &str) -> Result<Vec<u8>> {
        let mut attempt = 1u32;
        loop {
            match self.inner.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(failure) => match self.policy.decide(attempt, &failure) {
                    Some(delay) => {
                        tracing::warn!(
                            "Fetch of {} failed (attempt {}): {}; retrying in {:?}",
                            url,
                            attempt,
                            failure.message,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        return Err(ResolveError::Fetch {
                            url: url.to_string(),
                            message: failure.message,
                        })
                    }
                },
            }
        }
    }

    /// Fetches a document and decodes it as (lossy) UTF-8.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let body = self.get(url).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FailureKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Flaky {
        failures: u32,
        kind: FailureKind,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Fetcher for Flaky {
        async fn fetch(&self, _url: &str) -> std::result::Result<Vec<u8>, FetchFailure> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(FetchFailure::new(self.kind, "boom"))
            } else {
                Ok(b"ok".to_vec())
            }
        }
    }

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_no_retry_for_permanent() {
        let p = RetryPolicy::default();
        let failure = FetchFailure::new(FailureKind::Permanent, "404");
        assert_eq!(p.decide(1, &failure), None);
    }

    #[test]
    fn test_backoff_grows_and_is_capped() {
        let p = RetryPolicy {
            max_attempts: 20,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        };
        let failure = FetchFailure::new(FailureKind::Timeout, "slow");
        assert_eq!(p.decide(1, &failure), Some(Duration::from_millis(500)));
        assert_eq!(p.decide(2, &failure), Some(Duration::from_secs(1)));
        assert_eq!(p.decide(10, &failure), Some(Duration::from_secs(8)));
    }

    #[test]
    fn test_respects_max_attempts() {
        let p = instant_policy(3);
        let failure = FetchFailure::new(FailureKind::Throttled(503), "busy");
        assert!(p.decide(2, &failure).is_some());
        assert_eq!(p.decide(3, &failure), None);
    }

    #[test]
    fn test_recovers_after_transient_failures() {
        let flaky = Arc::new(Flaky {
            failures: 2,
            kind: FailureKind::Connection,
            calls: AtomicU32::new(0),
        });
        let fetcher = RetryingFetcher::new(flaky.clone(), instant_policy(3));

        let body = tokio_test::block_on(fetcher.get_text("https://example.com/")).unwrap();
        assert_eq!(body, "ok");
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_surfaces_fetch_error_when_exhausted() {
        let flaky = Arc::new(Flaky {
            failures: 10,
            kind: FailureKind::Timeout,
            calls: AtomicU32::new(0),
        });
        let fetcher = RetryingFetcher::new(flaky.clone(), instant_policy(2));

        let err = tokio_test::block_on(fetcher.get("https://example.com/feed.xml")).unwrap_err();
        assert!(matches!(err, ResolveError::Fetch { ref url, .. } if url == "https://example.com/feed.xml"));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_permanent_failure_is_not_retried() {
        let flaky = Arc::new(Flaky {
            failures: 1,
            kind: FailureKind::Permanent,
            calls: AtomicU32::new(0),
        });
        let fetcher = RetryingFetcher::new(flaky.clone(), instant_policy(5));

        assert!(tokio_test::block_on(fetcher.get("https://example.com/")).is_err());
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 1);
    }
}
