//! Exponential-backoff retry around [`RequestCoordinator::resolve`].
//!
//! Kept outside the coordinator: caching and de-duplication always apply,
//! retrying is something a caller opts into.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::coordinator::RequestCoordinator;
use crate::error::Result;

/// How often and how patiently to retry a failing resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included. Zero is treated as one.
    pub max_retries: u32,
    /// Delay after the first failure; doubles after each further failure
    pub initial_delay: Duration,
    /// Upper bound for a single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
            ..Self::default()
        }
    }

    /// Delay to wait after failed attempt number `attempt` (zero based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.min(30);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Resolves `key`, repeating the whole resolve while it fails.
///
/// `make_fetcher` is called once per attempt that actually needs a fetcher.
/// Only errors for which `FetchError::is_retryable` holds are retried; a
/// permanent failure is returned at once. Intermediate errors are logged and
/// dropped; only the last attempt's error is returned.
pub async fn resolve_with_retry<V, M, F, Fut>(
    coordinator: &RequestCoordinator<V>,
    key: &str,
    mut make_fetcher: M,
    ttl: Option<Duration>,
    policy: &RetryPolicy,
) -> Result<V>
where
    V: Clone + Send + Sync + 'static,
    M: FnMut() -> F,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<V>> + Send + 'static,
{
    let attempts = policy.max_retries.max(1);
    let mut attempt = 0;
    loop {
        match coordinator.resolve(key, make_fetcher(), ttl).await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => {
                debug!(key, error = %err, "not retrying permanent failure");
                return Err(err);
            }
            Err(err) if attempt + 1 >= attempts => return Err(err),
            Err(err) => {
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    key,
                    error = %err,
                    "attempt {}/{} failed, retrying in {}ms",
                    attempt + 1,
                    attempts,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
