//! The uniform response returned for every successful dispatch

use super::normalize::normalize;
use super::types::{ResultSet, Row};
use crate::backends::BackendId;
use crate::intents::IntentKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result envelope
///
/// Built only through [`ResultEnvelope::from_result_set`], which normalizes
/// the rows, so `row_count` always equals the number of rows and exactly one
/// backend is named as the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    intent: IntentKind,
    source: BackendId,
    columns: Vec<String>,
    rows: Vec<Row>,
    row_count: usize,
    #[serde(default)]
    warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    metadata: Map<String, Value>,
    elapsed_ms: u64,
    generated_at: DateTime<Utc>,
}

impl ResultEnvelope {
    /// Normalize a backend result and wrap it
    pub fn from_result_set(
        intent: IntentKind,
        source: BackendId,
        mut table: ResultSet,
        warnings: Vec<String>,
        elapsed_ms: u64,
    ) -> Self {
        normalize(&mut table);
        let ResultSet {
            columns,
            rows,
            summary,
            metadata,
        } = table;

        Self {
            intent,
            source,
            row_count: rows.len(),
            columns,
            rows,
            warnings,
            summary,
            metadata,
            elapsed_ms,
            generated_at: Utc::now(),
        }
    }

    pub fn intent(&self) -> IntentKind {
        self.intent
    }

    /// Backend that produced the rows
    pub fn source(&self) -> BackendId {
        self.source
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// One entry per candidate skipped or failed before the source
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_counts_rows() {
        let mut table = ResultSet::new(["target", "ra"]);
        table.push_values(vec![json!("M87"), json!(187.7)]);
        table.push_values(vec![json!("M87")]);

        let envelope = ResultEnvelope::from_result_set(
            IntentKind::ByTarget,
            BackendId::Tap,
            table.with_summary("Found 2"),
            vec!["alminer failed".to_string()],
            12,
        );

        assert_eq!(envelope.row_count(), 2);
        assert_eq!(envelope.row_count(), envelope.rows().len());
        assert_eq!(envelope.source(), BackendId::Tap);
        assert_eq!(envelope.rows()[1]["ra"], Value::Null);
        assert_eq!(envelope.summary(), Some("Found 2"));
    }

    #[test]
    fn test_serialized_shape() {
        let envelope = ResultEnvelope::from_result_set(
            IntentKind::InfoLookup,
            BackendId::Reference,
            ResultSet::new(["band"]),
            Vec::new(),
            0,
        );
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["intent"], "info_lookup");
        assert_eq!(json["source"], "reference");
        assert_eq!(json["row_count"], 0);
        assert_eq!(json["warnings"], json!([]));
        assert!(json.get("metadata").is_none());
        assert!(json["generated_at"].is_string());
    }
}
