// Fire report endpoint
//
// `/reports` returns the raw database node: a JSON object keyed by report id.
// Entries are decoded one at a time so a single malformed report never hides
// the rest.

use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::rest::client::ApiClient;
use crate::rest::models::{KeyedReport, ReportRecord};

impl ApiClient {
    /// List every stored fire report, in backend order.
    ///
    /// `GET /reports`. The backend answers 404 when no report exists; that
    /// is returned as an error for the caller to classify.
    pub async fn list_reports(&self) -> Result<Vec<KeyedReport>, Error> {
        let raw: Value = self.get("reports").await?;
        Ok(decode_reports(raw))
    }
}

/// Decode the reports node. Objects are keyed by id; arrays (a database
/// quirk for integer keys) use the index as id.
pub(crate) fn decode_reports(raw: Value) -> Vec<KeyedReport> {
    let entries: Vec<(String, Value)> = match raw {
        Value::Object(map) => map.into_iter().collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|(id, value)| {
            if value.is_null() {
                return None;
            }
            match serde_json::from_value::<ReportRecord>(value) {
                Ok(record) => Some(KeyedReport { id, record }),
                Err(e) => {
                    debug!(id, error = %e, "skipping malformed report");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_keyed_object_and_skips_garbage() {
        let raw = json!({
            "-Nabc": { "timestamp": "2025-01-01T10:00:00", "severity": "high", "confidence": 91 },
            "-Nxyz": "not a report",
            "-Nnull": null
        });
        let reports = decode_reports(raw);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].id, "-Nabc");
        assert_eq!(reports[0].record.severity.as_deref(), Some("high"));
    }

    #[test]
    fn decodes_sparse_array() {
        let raw = json!([null, { "severity": "medium" }]);
        let reports = decode_reports(raw);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].id, "1");
    }
}
