//! API Handlers
//!
//! HTTP request handlers for each report and cache administration endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::config::Config;
use crate::error::Result;
use crate::models::{ClearResponse, HealthResponse, ReportRequest, StatsResponse};
use crate::sales::{SalesBackend, SalesClient, SalesReport, SalesService};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Report service, owning the cache and in-flight map
    pub service: Arc<SalesService>,
}

impl AppState {
    /// Creates a new AppState around an existing service.
    pub fn new(service: SalesService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Creates a new AppState from configuration, talking to the backend
    /// named there.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client: Arc<dyn SalesBackend> = Arc::new(SalesClient::from_config(config)?);
        Ok(Self::new(SalesService::from_config(config, client)))
    }
}

/// Handler for POST /reports/:report
///
/// Resolves a report for the given range, from cache when possible.
pub async fn report_handler(
    State(state): State<AppState>,
    Path(report): Path<String>,
    Json(req): Json<ReportRequest>,
) -> Result<Json<Value>> {
    let report: SalesReport = report.parse()?;

    if req.refresh {
        state.service.refresh(report, &req.params)?;
    }

    let value = state.service.fetch_report(report, &req.params).await?;
    Ok(Json(value))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.service.coordinator().stats().into())
}

/// Handler for DELETE /cache
pub async fn clear_all_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    Json(ClearResponse::all(state.service.clear_all()))
}

/// Handler for DELETE /cache/:key
///
/// Clearing a key that is not cached still succeeds.
pub async fn clear_key_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<ClearResponse> {
    let removed = state.service.clear_key(&key);
    Json(ClearResponse::key(&key, removed))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
