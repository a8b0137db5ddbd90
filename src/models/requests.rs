//! Request DTOs for the report API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::sales::ReportParams;

/// Request body for `POST /reports/:report`
///
/// # Fields
/// - `start_date`, `end_date`: the range to report on (`YYYY-MM-DD`)
/// - `compare_start_date`, `compare_end_date`: second range, comparison only
/// - `refresh`: drop any cached result before resolving
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRequest {
    #[serde(flatten)]
    pub params: ReportParams,
    #[serde(default)]
    pub refresh: bool,
}
