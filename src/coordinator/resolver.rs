//! Request Coordinator
//!
//! Sits in front of every fetcher: answers from the TTL store when it can,
//! joins a running fetch for the same key when one exists, and otherwise
//! starts the fetch, caching the value if it succeeds.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, TtlStore, DEFAULT_TTL};
use crate::coordinator::RateLimiter;
use crate::error::{FetchError, Result};

/// Pending fetch shared by every caller of one key.
type SharedFetch<V> = Shared<BoxFuture<'static, Result<V>>>;

// == In-Flight Record ==
struct InFlight<V> {
    /// Distinguishes successive fetches of the same key
    id: u64,
    fetch: SharedFetch<V>,
}

// == Shared State ==
struct State<V> {
    store: TtlStore<V>,
    in_flight: HashMap<String, InFlight<V>>,
    next_id: u64,
}

impl<V> State<V> {
    /// Drops the in-flight record for `key` only if it still belongs to fetch `id`.
    fn release(&mut self, key: &str, id: u64) -> bool {
        if self.in_flight.get(key).is_some_and(|record| record.id == id) {
            self.in_flight.remove(key);
            true
        } else {
            false
        }
    }
}

fn lock_state<V>(state: &Mutex<State<V>>) -> MutexGuard<'_, State<V>> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Removes the in-flight record when the fetch task ends, however it ends.
struct ReleaseGuard<V> {
    state: Arc<Mutex<State<V>>>,
    key: String,
    id: u64,
}

impl<V> Drop for ReleaseGuard<V> {
    fn drop(&mut self) {
        if lock_state(&self.state).release(&self.key, self.id) {
            warn!(key = %self.key, "fetch ended without settling, in-flight record released");
        }
    }
}

// == Request Coordinator ==
/// Cache plus request de-duplication in front of caller-supplied fetchers.
///
/// Cloning is cheap and every clone shares the same cache and in-flight
/// map, so one instance is created at startup and handed to each consumer.
pub struct RequestCoordinator<V> {
    state: Arc<Mutex<State<V>>>,
}

impl<V> Clone for RequestCoordinator<V> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<V> RequestCoordinator<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates a coordinator whose cache uses `default_ttl` for entries
    /// resolved without an explicit TTL.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                store: TtlStore::new(default_ttl),
                in_flight: HashMap::new(),
                next_id: 0,
            })),
        }
    }

    /// Creates a coordinator with the 20 minute default TTL.
    pub fn create() -> Self {
        Self::new(DEFAULT_TTL)
    }

    fn lock(&self) -> MutexGuard<'_, State<V>> {
        lock_state(&self.state)
    }

    // == Resolve ==
    /// Returns the value for `key`, calling `fetcher` only when neither a
    /// fresh cached value nor a running fetch for `key` exists.
    ///
    /// Every caller that arrives while a fetch is running receives that
    /// fetch's outcome, error included. Successful values are cached for
    /// `ttl` (or the default); errors are never cached.
    ///
    /// The fetch runs as its own tokio task, so dropping the returned future
    /// does not cancel it: it still completes and fills the cache. Must be
    /// called from within a tokio runtime.
    pub async fn resolve<F, Fut>(&self, key: &str, fetcher: F, ttl: Option<Duration>) -> Result<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let fetch = {
            let mut state = self.lock();

            if let Some(value) = state.store.get(key) {
                debug!(key, "cache hit");
                return Ok(value);
            }

            let joined = state.in_flight.get(key).map(|record| record.fetch.clone());
            match joined {
                Some(fetch) => {
                    debug!(key, "joining in-flight request");
                    state.store.stats_mut().record_join();
                    fetch
                }
                None => {
                    let id = state.next_id;
                    state.next_id += 1;
                    state.store.stats_mut().record_fetch();

                    let fetch = self.spawn_fetch(key.to_string(), id, fetcher, ttl);
                    state.in_flight.insert(
                        key.to_string(),
                        InFlight {
                            id,
                            fetch: fetch.clone(),
                        },
                    );
                    fetch
                }
            }
        };

        fetch.await
    }

    /// Runs the fetcher on its own task and publishes the outcome.
    ///
    /// Caching the value and dropping the in-flight record happen under one
    /// lock, so no caller can observe the key as neither cached nor pending
    /// after a success.
    fn spawn_fetch<F, Fut>(
        &self,
        key: String,
        id: u64,
        fetcher: F,
        ttl: Option<Duration>,
    ) -> SharedFetch<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        let task_key = key.clone();

        let handle = tokio::spawn(async move {
            let _guard = ReleaseGuard {
                state: Arc::clone(&state),
                key: task_key.clone(),
                id,
            };

            info!(key = %task_key, "fetching");
            let result = fetcher().await;

            {
                let mut state = lock_state(&state);
                match &result {
                    Ok(value) => {
                        state.store.set(task_key.clone(), value.clone(), ttl);
                    }
                    Err(err) => {
                        warn!(key = %task_key, error = %err, "fetch failed");
                        state.store.stats_mut().record_failure();
                    }
                }
                state.release(&task_key, id);
            }

            result
        });

        async move {
            match handle.await {
                Ok(result) => result,
                Err(err) => Err(FetchError::Internal(format!(
                    "fetch for '{}' did not complete: {}",
                    key, err
                ))),
            }
        }
        .boxed()
        .shared()
    }

    // == Guarded Resolve ==
    /// Checks `limiter` for `limit_key` before resolving.
    ///
    /// Over quota the call fails with [`FetchError::RateLimited`] without
    /// touching the cache or calling `fetcher`.
    pub async fn resolve_guarded<F, Fut>(
        &self,
        limiter: &RateLimiter,
        limit_key: &str,
        key: &str,
        fetcher: F,
        ttl: Option<Duration>,
    ) -> Result<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        limiter.check(limit_key)?;
        self.resolve(key, fetcher, ttl).await
    }

    // == Cache Control ==
    /// Drops one cached key, or the whole cache when `key` is `None`.
    ///
    /// Running fetches are left alone and will still cache their result.
    /// Returns how many entries were removed.
    pub fn clear(&self, key: Option<&str>) -> usize {
        let mut state = self.lock();
        match key {
            Some(key) => {
                let removed = state.store.delete(key);
                debug!(key, removed, "cache key cleared");
                usize::from(removed)
            }
            None => {
                let removed = state.store.len();
                state.store.clear();
                info!(removed, "cache cleared");
                removed
            }
        }
    }

    /// Whether `key` would be answered without a new fetch: a fresh value is
    /// cached or a fetch for it is already running. Counters are untouched.
    pub fn cached(&self, key: &str) -> bool {
        let state = self.lock();
        state.store.contains(key) || state.in_flight.contains_key(key)
    }

    /// Removes expired entries, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.lock().store.purge_expired()
    }

    // == Observability ==
    /// Number of cached entries.
    pub fn size(&self) -> usize {
        self.lock().store.len()
    }

    /// Keys with a fetch currently running, sorted.
    pub fn in_flight(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().in_flight.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Snapshot of cache and coordinator counters.
    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        let mut stats = state.store.stats();
        stats.in_flight = state.in_flight.len();
        stats
    }
}

impl<V> Default for RequestCoordinator<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::create()
    }
}
