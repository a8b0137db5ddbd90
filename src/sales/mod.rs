//! Sales Module
//!
//! The consumers of the coordinator: report definitions, the backend seam,
//! its HTTP implementation and the per-widget service.

mod client;
mod report;
mod service;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::Result;

pub use client::SalesClient;
pub use report::{DateRange, ReportParams, SalesReport};
pub use service::SalesService;

/// Source of report data.
///
/// The returned future must own everything it needs, since it runs on its
/// own task after the caller may have gone away.
pub trait SalesBackend: Send + Sync + 'static {
    fn fetch(&self, report: SalesReport, body: Value) -> BoxFuture<'static, Result<Value>>;
}
