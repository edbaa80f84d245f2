//! Multi-source batch report

use super::error::ErrorReport;
use crate::results::ResultEnvelope;
use serde::Serialize;

/// Outcome for one source of a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Ok { result: ResultEnvelope },
    Failed { error: ErrorReport },
}

impl SourceOutcome {
    pub fn envelope(&self) -> Option<&ResultEnvelope> {
        match self {
            Self::Ok { result } => Some(result),
            Self::Failed { .. } => None,
        }
    }
}

/// Named outcome; `results` keeps input order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceResult {
    pub source_name: String,
    #[serde(flatten)]
    pub outcome: SourceOutcome,
}

/// Per-source results of a multi-source batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub sources_queried: usize,
    pub sources_with_data: usize,
    pub total_rows: usize,
    pub results: Vec<SourceResult>,
    pub summary: String,
}

impl BatchReport {
    pub fn new(results: Vec<SourceResult>) -> Self {
        let envelopes = results.iter().filter_map(|r| r.outcome.envelope());
        let sources_with_data = envelopes.clone().filter(|e| e.row_count() > 0).count();
        let total_rows = envelopes.map(|e| e.row_count()).sum();

        Self {
            sources_queried: results.len(),
            sources_with_data,
            total_rows,
            summary: format!(
                "Queried {} sources, {} have ALMA data ({} total observations)",
                results.len(),
                sources_with_data,
                total_rows
            ),
            results,
        }
    }

    /// Outcome for a source name
    pub fn get(&self, source_name: &str) -> Option<&SourceOutcome> {
        self.results
            .iter()
            .find(|r| r.source_name == source_name)
            .map(|r| &r.outcome)
    }
}
