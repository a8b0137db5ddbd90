//! Salesboard - cached, de-duplicated data layer for a sales dashboard
//!
//! Every report goes through a [`RequestCoordinator`]: fresh results come
//! from a TTL cache, concurrent requests for the same key share one backend
//! call, and failures are never cached.

pub mod api;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod models;
pub mod sales;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use coordinator::{resolve_with_retry, RateLimiter, RequestCoordinator, RetryPolicy};
pub use error::FetchError;
pub use tasks::spawn_cleanup_task;
