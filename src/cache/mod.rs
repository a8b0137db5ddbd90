//! Cache Module
//!
//! Provides in-memory caching with per-entry TTL expiration and the key
//! builder shared by every cached operation.

mod entry;
mod key;
mod stats;
mod store;


use std::time::Duration;

// Re-export public types
pub use entry::CacheEntry;
pub use key::build_key;
pub use stats::CacheStats;
pub use store::TtlStore;

// == Public Constants ==
/// TTL applied when a caller does not pick one
pub const DEFAULT_TTL: Duration = Duration::from_secs(20 * 60);

/// TTL used for chart aggregates
pub const CHART_TTL: Duration = Duration::from_secs(15 * 60);
