//! Sales Service
//!
//! One operation per dashboard widget. Each builds its cache key from the
//! report name and parameters, then resolves through the shared coordinator
//! with the report's TTL, the service's retry policy and its rate limit.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::cache::{build_key, CHART_TTL, DEFAULT_TTL};
use crate::config::Config;
use crate::coordinator::{resolve_with_retry, RateLimiter, RequestCoordinator, RetryPolicy};
use crate::error::{FetchError, Result};
use crate::sales::{DateRange, ReportParams, SalesBackend, SalesReport};

pub struct SalesService {
    backend: Arc<dyn SalesBackend>,
    coordinator: RequestCoordinator<Value>,
    retry: RetryPolicy,
    limiter: Option<RateLimiter>,
    chart_ttl: Duration,
    default_ttl: Duration,
}

impl SalesService {
    /// Creates a service with default TTLs, the default retry policy and no
    /// rate limit.
    pub fn new(backend: Arc<dyn SalesBackend>, coordinator: RequestCoordinator<Value>) -> Self {
        Self {
            backend,
            coordinator,
            retry: RetryPolicy::default(),
            limiter: None,
            chart_ttl: CHART_TTL,
            default_ttl: DEFAULT_TTL,
        }
    }

    /// Creates a service whose TTLs, retry policy and rate limit come from
    /// `config`. No limiter is installed unless `rate_limit_max` is set.
    pub fn from_config(config: &Config, backend: Arc<dyn SalesBackend>) -> Self {
        let default_ttl = Duration::from_secs(config.default_ttl);
        let service = Self::new(backend, RequestCoordinator::new(default_ttl))
            .with_ttls(Duration::from_secs(config.chart_ttl), default_ttl)
            .with_retry(RetryPolicy::new(
                config.retry_max,
                Duration::from_millis(config.retry_base_ms),
            ));

        match config.rate_limit_max {
            Some(max) => service.with_rate_limiter(RateLimiter::new(
                max,
                Duration::from_secs(config.rate_limit_window),
            )),
            None => service,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn with_ttls(mut self, chart_ttl: Duration, default_ttl: Duration) -> Self {
        self.chart_ttl = chart_ttl;
        self.default_ttl = default_ttl;
        self
    }

    pub fn coordinator(&self) -> &RequestCoordinator<Value> {
        &self.coordinator
    }

    /// TTL a report's results are cached for.
    pub fn ttl_for(&self, report: SalesReport) -> Duration {
        if report.is_chart() {
            self.chart_ttl
        } else {
            self.default_ttl
        }
    }

    /// Cache key of a report request.
    pub fn cache_key(report: SalesReport, params: &ReportParams) -> Result<String> {
        build_key(report.as_str(), params)
    }

    // == Widget Operations ==
    pub async fn hours_chart(&self, day: &DateRange) -> Result<Value> {
        self.fetch_report(SalesReport::Hours, &ReportParams::range(day))
            .await
    }

    pub async fn weekly_chart(&self, week: &DateRange) -> Result<Value> {
        self.fetch_report(SalesReport::Weekly, &ReportParams::range(week))
            .await
    }

    pub async fn monthly_chart(&self, month: &DateRange) -> Result<Value> {
        self.fetch_report(SalesReport::Monthly, &ReportParams::range(month))
            .await
    }

    pub async fn dashboard(&self, range: &DateRange) -> Result<Value> {
        self.fetch_report(SalesReport::Dashboard, &ReportParams::range(range))
            .await
    }

    pub async fn comparison(&self, current: &DateRange, previous: &DateRange) -> Result<Value> {
        self.fetch_report(
            SalesReport::Comparison,
            &ReportParams::comparison(current, previous),
        )
        .await
    }

    // == Fetch Report ==
    /// Resolves any report: validate, rate-limit on a cache miss, then cached
    /// or fetched.
    pub async fn fetch_report(&self, report: SalesReport, params: &ReportParams) -> Result<Value> {
        params.validate_for(report)?;
        let key = Self::cache_key(report, params)?;

        // Only requests that would reach the backend spend quota
        if let Some(limiter) = &self.limiter {
            if !self.coordinator.cached(&key) {
                limiter.check(report.as_str())?;
            }
        }

        let body = serde_json::to_value(params)
            .map_err(|e| FetchError::InvalidRequest(e.to_string()))?;
        let backend = Arc::clone(&self.backend);

        debug!(%report, key = %key, "resolving report");
        resolve_with_retry(
            &self.coordinator,
            &key,
            || {
                let backend = Arc::clone(&backend);
                let body = body.clone();
                move || backend.fetch(report, body)
            },
            Some(self.ttl_for(report)),
            &self.retry,
        )
        .await
    }

    // == Invalidation ==
    /// Drops the cached result of one report request so the next call
    /// fetches it again.
    pub fn refresh(&self, report: SalesReport, params: &ReportParams) -> Result<()> {
        let key = Self::cache_key(report, params)?;
        self.coordinator.clear(Some(&key));
        Ok(())
    }

    /// Drops one cache key as-is. Returns whether it was cached.
    pub fn clear_key(&self, key: &str) -> bool {
        self.coordinator.clear(Some(key)) > 0
    }

    /// Drops every cached report, returning how many entries were removed.
    pub fn clear_all(&self) -> usize {
        self.coordinator.clear(None)
    }
}
