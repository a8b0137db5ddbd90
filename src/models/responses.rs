//! Response DTOs for the report API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for `DELETE /cache` and `DELETE /cache/:key`
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Success message
    pub message: String,
    /// Number of entries removed
    pub cleared: usize,
}

impl ClearResponse {
    /// Response for a whole-cache clear.
    pub fn all(cleared: usize) -> Self {
        Self {
            message: format!("Cleared {} cached entries", cleared),
            cleared,
        }
    }

    /// Response for a single-key clear.
    pub fn key(key: &str, removed: bool) -> Self {
        Self {
            message: format!("Key '{}' cleared", key),
            cleared: usize::from(removed),
        }
    }
}

/// Response body for `GET /stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub fetches: u64,
    pub joins: u64,
    pub failures: u64,
    pub total_entries: usize,
    pub in_flight: usize,
    /// Hit rate as a fraction (0.0 to 1.0)
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            expirations: stats.expirations,
            fetches: stats.fetches,
            joins: stats.joins,
            failures: stats.failures,
            total_entries: stats.total_entries,
            in_flight: stats.in_flight,
        }
    }
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status ("healthy")
    pub status: String,
    /// Time the check was answered
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}
