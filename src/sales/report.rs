//! Report kinds and their request parameters.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{FetchError, Result};

// == Sales Report ==
/// One logical backend operation, one per dashboard widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalesReport {
    /// Sales per hour of a single day
    Hours,
    /// Sales per day of a week
    Weekly,
    /// Sales per day of a month
    Monthly,
    /// Main dashboard totals by branch and product
    Dashboard,
    /// Custom range compared against a second range
    Comparison,
}

impl SalesReport {
    pub const ALL: [SalesReport; 5] = [
        SalesReport::Hours,
        SalesReport::Weekly,
        SalesReport::Monthly,
        SalesReport::Dashboard,
        SalesReport::Comparison,
    ];

    /// Operation name, used both as backend path segment and key prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            SalesReport::Hours => "hours",
            SalesReport::Weekly => "weekly",
            SalesReport::Monthly => "monthly",
            SalesReport::Dashboard => "dashboard",
            SalesReport::Comparison => "comparison",
        }
    }

    /// Chart aggregates get the shorter chart TTL.
    pub fn is_chart(&self) -> bool {
        matches!(
            self,
            SalesReport::Hours | SalesReport::Weekly | SalesReport::Monthly
        )
    }
}

impl fmt::Display for SalesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SalesReport {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self> {
        SalesReport::ALL
            .into_iter()
            .find(|report| report.as_str() == s)
            .ok_or_else(|| FetchError::InvalidRequest(format!("unknown report '{}'", s)))
    }
}

// == Date Range ==
/// Inclusive range of calendar days, serialized as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start_date > self.end_date {
            return Err(FetchError::InvalidRequest(format!(
                "start_date {} is after end_date {}",
                self.start_date, self.end_date
            )));
        }
        Ok(())
    }
}

// == Report Params ==
/// Body sent to the backend for a report; also the input of its cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_end_date: Option<NaiveDate>,
}

impl ReportParams {
    pub fn range(range: &DateRange) -> Self {
        Self {
            start_date: range.start_date,
            end_date: range.end_date,
            compare_start_date: None,
            compare_end_date: None,
        }
    }

    pub fn comparison(current: &DateRange, previous: &DateRange) -> Self {
        Self {
            compare_start_date: Some(previous.start_date),
            compare_end_date: Some(previous.end_date),
            ..Self::range(current)
        }
    }

    pub fn current(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    /// Checks the ranges are ordered and that only comparisons carry a
    /// second range.
    pub fn validate_for(&self, report: SalesReport) -> Result<()> {
        self.current().validate()?;

        match (report, self.compare_start_date, self.compare_end_date) {
            (SalesReport::Comparison, Some(start), Some(end)) => {
                DateRange::new(start, end).validate()
            }
            (SalesReport::Comparison, _, _) => Err(FetchError::InvalidRequest(
                "comparison requires compare_start_date and compare_end_date".to_string(),
            )),
            (_, None, None) => Ok(()),
            (other, _, _) => Err(FetchError::InvalidRequest(format!(
                "report '{}' does not take a comparison range",
                other
            ))),
        }
    }
}
