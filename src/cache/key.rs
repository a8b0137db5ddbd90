//! Cache Key Builder
//!
//! Turns a logical operation name plus its parameters into a stable key.

use serde::Serialize;

use crate::error::{FetchError, Result};

/// Builds the cache key for `op` called with `params`.
///
/// The key is `"{op}:{json}"`. Parameters go through `serde_json::Value`,
/// whose objects are ordered maps, so field order in the source type or map
/// never changes the key.
///
/// ```
/// use std::collections::HashMap;
/// use salesboard::cache::build_key;
///
/// let mut params = HashMap::new();
/// params.insert("start_date", "2025-09-13");
/// params.insert("end_date", "2025-09-13");
///
/// let key = build_key("hours", &params).unwrap();
/// assert_eq!(key, r#"hours:{"end_date":"2025-09-13","start_date":"2025-09-13"}"#);
/// ```
pub fn build_key<P: Serialize + ?Sized>(op: &str, params: &P) -> Result<String> {
    let value = serde_json::to_value(params)
        .map_err(|e| FetchError::InvalidRequest(format!("unserializable parameters: {}", e)))?;
    Ok(format!("{}:{}", op, value))
}
