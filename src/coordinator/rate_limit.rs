//! Per-key sliding-window rate limiter.
//!
//! Unlike a pacing limiter this never waits: a key over its quota is
//! rejected at once with the time left until a slot frees up.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

use crate::error::{FetchError, Result};

/// Default admissions per window.
const DEFAULT_MAX_REQUESTS: usize = 30;

/// Default sliding window duration.
const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Sliding-window quota keyed by a caller-chosen string.
///
/// Each key keeps the instants of its recent admissions; a request is
/// admitted while fewer than `max_requests` of them fall inside `window`.
pub struct RateLimiter {
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    /// Create a rate limiter with explicit quota and window.
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    /// Admit one request for `key`, or reject it with `RateLimited`.
    pub fn check(&self, key: &str) -> Result<()> {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        // Keys with no admission left inside the window are forgotten
        windows.retain(|_, stamps| {
            self.evict_stale(stamps, now);
            !stamps.is_empty()
        });
        let stamps = windows.entry(key.to_string()).or_default();

        if stamps.len() < self.max_requests {
            stamps.push_back(now);
            return Ok(());
        }

        let retry_after = match stamps.front() {
            Some(&oldest) => (oldest + self.window).saturating_duration_since(now),
            None => self.window,
        };
        warn!(
            key,
            retry_after_ms = retry_after.as_millis() as u64,
            "rate limit exceeded"
        );
        Err(FetchError::RateLimited {
            key: key.to_string(),
            retry_after,
        })
    }

    /// Admissions still available for `key` in the current window.
    pub fn remaining(&self, key: &str) -> usize {
        let now = Instant::now();
        let windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let active = windows
            .get(key)
            .map(|stamps| {
                stamps
                    .iter()
                    .filter(|&&t| now.saturating_duration_since(t) < self.window)
                    .count()
            })
            .unwrap_or(0);
        self.max_requests.saturating_sub(active)
    }

    /// Forget the history of `key`.
    pub fn reset(&self, key: &str) {
        self.windows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }

    /// The configured admissions per window.
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    fn evict_stale(&self, stamps: &mut VecDeque<Instant>, now: Instant) {
        while stamps
            .front()
            .is_some_and(|&t| now.saturating_duration_since(t) >= self.window)
        {
            stamps.pop_front();
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}
