//! API Module
//!
//! HTTP handlers and routing for the report service.
//!
//! # Endpoints
//! - `POST /reports/:report` - Resolve a report (hours, weekly, monthly, dashboard, comparison)
//! - `GET /stats` - Cache statistics
//! - `DELETE /cache` - Clear the cache
//! - `DELETE /cache/:key` - Clear one key
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
