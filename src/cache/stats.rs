//! Cache Statistics Module
//!
//! Tracks cache and coordinator metrics: hits, misses, expirations and how
//! misses were resolved (fresh fetch or joined in-flight request).

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of reads answered from a fresh entry
    pub hits: u64,
    /// Number of reads that found nothing usable (absent or expired)
    pub misses: u64,
    /// Number of entries dropped because their TTL elapsed
    pub expirations: u64,
    /// Number of fetchers actually invoked
    pub fetches: u64,
    /// Number of callers that joined an already running fetch
    pub joins: u64,
    /// Number of fetches that settled with an error
    pub failures: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Current number of keys with a fetch in flight
    pub in_flight: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Adds `count` expired entries to the expiration counter.
    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn record_fetch(&mut self) {
        self.fetches += 1;
    }

    pub fn record_join(&mut self) {
        self.joins += 1;
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
