//! Request Coordinator Module
//!
//! Cache-first, de-duplicated resolution of fetches, plus the optional
//! retry and rate-limit layers callers can put around it.

mod rate_limit;
mod resolver;
mod retry;

pub use rate_limit::RateLimiter;
pub use resolver::RequestCoordinator;
pub use retry::{resolve_with_retry, RetryPolicy};
