//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// TTL in seconds for cached reports without a more specific TTL
    pub default_ttl: u64,
    /// TTL in seconds for chart aggregates (hours, weekly, monthly)
    pub chart_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background purge interval in seconds
    pub cleanup_interval: u64,
    /// Base URL of the sales backend
    pub sales_api_url: String,
    /// Static bearer token sent to the sales backend
    pub sales_api_token: String,
    /// Backend request timeout in seconds
    pub request_timeout: u64,
    /// Total attempts per report fetch
    pub retry_max: u32,
    /// Delay before the first retry in milliseconds, doubled per retry
    pub retry_base_ms: u64,
    /// Backend fetches admitted per window and report; unset disables the limit
    pub rate_limit_max: Option<usize>,
    /// Rate-limit window in seconds
    pub rate_limit_window: u64,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL` - Default report TTL in seconds (default: 1200)
    /// - `CHART_TTL` - Chart TTL in seconds (default: 900)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Purge frequency in seconds (default: 60)
    /// - `SALES_API_URL` - Sales backend base URL (default: http://localhost:8000/api/sales)
    /// - `SALES_API_TOKEN` - Bearer token for the backend (default: empty)
    /// - `REQUEST_TIMEOUT` - Backend timeout in seconds (default: 30)
    /// - `RETRY_MAX` - Attempts per fetch (default: 3)
    /// - `RETRY_BASE_MS` - First retry delay in milliseconds (default: 1000)
    /// - `RATE_LIMIT_MAX` - Fetches per window and report (default: unlimited)
    /// - `RATE_LIMIT_WINDOW` - Window in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl: env_or("DEFAULT_TTL", defaults.default_ttl),
            chart_ttl: env_or("CHART_TTL", defaults.chart_ttl),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            sales_api_url: env::var("SALES_API_URL").unwrap_or(defaults.sales_api_url),
            sales_api_token: env::var("SALES_API_TOKEN").unwrap_or(defaults.sales_api_token),
            request_timeout: env_or("REQUEST_TIMEOUT", defaults.request_timeout),
            retry_max: env_or("RETRY_MAX", defaults.retry_max),
            retry_base_ms: env_or("RETRY_BASE_MS", defaults.retry_base_ms),
            rate_limit_max: env::var("RATE_LIMIT_MAX")
                .ok()
                .and_then(|v| v.parse().ok())
                .or(defaults.rate_limit_max),
            rate_limit_window: env_or("RATE_LIMIT_WINDOW", defaults.rate_limit_window),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: 1200,
            chart_ttl: 900,
            server_port: 3000,
            cleanup_interval: 60,
            sales_api_url: "http://localhost:8000/api/sales".to_string(),
            sales_api_token: String::new(),
            request_timeout: 30,
            retry_max: 3,
            retry_base_ms: 1000,
            rate_limit_max: None,
            rate_limit_window: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_ttl, 1200);
        assert_eq!(config.chart_ttl, 900);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 60);
        assert_eq!(config.retry_max, 3);
        assert_eq!(config.rate_limit_max, None);
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        env::set_var("SALESBOARD_TEST_PORT", "not-a-number");
        assert_eq!(env_or("SALESBOARD_TEST_PORT", 3000u16), 3000);

        env::set_var("SALESBOARD_TEST_PORT", "8080");
        assert_eq!(env_or("SALESBOARD_TEST_PORT", 3000u16), 8080);

        env::remove_var("SALESBOARD_TEST_PORT");
        assert_eq!(env_or("SALESBOARD_TEST_PORT", 3000u16), 3000);
    }
}
