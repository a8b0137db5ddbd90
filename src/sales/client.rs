//! HTTP client for the sales backend.
//!
//! Every report is a POST of its [`ReportParams`](super::ReportParams) as
//! JSON to `{base_url}/{report}`, authenticated with a static bearer token.

use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{FetchError, Result};
use crate::sales::{SalesBackend, SalesReport};

/// reqwest-backed [`SalesBackend`].
#[derive(Debug, Clone)]
pub struct SalesClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl SalesClient {
    /// Creates a client for `base_url` with a request timeout.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.sales_api_url.clone(),
            config.sales_api_token.clone(),
            Duration::from_secs(config.request_timeout),
        )
    }

    /// Full URL for a report.
    pub fn url_for(&self, report: SalesReport) -> String {
        format!("{}/{}", self.base_url, report.as_str())
    }
}

impl SalesBackend for SalesClient {
    fn fetch(&self, report: SalesReport, body: Value) -> BoxFuture<'static, Result<Value>> {
        let request = self
            .http
            .post(self.url_for(report))
            .bearer_auth(&self.token)
            .json(&body);

        async move {
            debug!(%report, "POST to sales backend");
            let response = request.send().await?;

            let status = response.status();
            if !status.is_success() {
                let detail = response.text().await.unwrap_or_default();
                return Err(FetchError::http_status(
                    status.as_u16(),
                    format!("{} report failed with {}: {}", report, status, detail),
                ));
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| FetchError::Malformed(format!("{} report: {}", report, e)))
        }
        .boxed()
    }
}
