//! API Routes
//!
//! Configures the Axum router with all report and cache endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_all_handler, clear_key_handler, health_handler, report_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /reports/:report` - Resolve a report for a date range
/// - `GET /stats` - Cache and coordinator statistics
/// - `DELETE /cache` - Clear every cached report
/// - `DELETE /cache/:key` - Clear one cache key
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin, the dashboard is served from elsewhere
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/reports/:report", post(report_handler))
        .route("/stats", get(stats_handler))
        .route("/cache", delete(clear_all_handler))
        .route("/cache/:key", delete(clear_key_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
