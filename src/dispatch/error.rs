//! Dispatch errors

use crate::backends::BackendId;
use crate::intents::{IntentKind, ParamError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Why a candidate call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The backend ran the query and reported an error
    QueryFailed,
    /// The call did not complete within the backend's timeout
    TimedOut,
    /// The backend reported itself uninitialized
    Unavailable,
}

/// One failed backend call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub backend: BackendId,
    pub intent: IntentKind,
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FailureKind::TimedOut => write!(f, "{} timed out: {}", self.backend, self.message),
            _ => write!(f, "{} failed: {}", self.backend, self.message),
        }
    }
}

/// A candidate passed over without a call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkipNote {
    pub backend: BackendId,
    pub reason: String,
}

impl fmt::Display for SkipNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} skipped: {}", self.backend, self.reason)
    }
}

/// Failure of a whole dispatch
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    /// Parameters failed their checks; no backend was contacted
    #[error("invalid parameters: {0}")]
    InvalidParameters(#[from] ParamError),

    /// No candidate produced a result
    #[error("all backends failed for {intent}")]
    AllBackendsFailed {
        intent: IntentKind,
        /// Failed calls in attempt order
        records: Vec<ErrorRecord>,
        skipped: Vec<SkipNote>,
    },
}

impl DispatchError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidParameters(_) => "invalid_parameters",
            Self::AllBackendsFailed { .. } => "all_backends_failed",
        }
    }

    /// Structured form sent back to callers
    pub fn report(&self) -> ErrorReport {
        let mut report = ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
            field: None,
            intent: None,
            records: Vec::new(),
            skipped: Vec::new(),
        };
        match self {
            Self::InvalidParameters(e) => report.field = Some(e.field.clone()),
            Self::AllBackendsFailed {
                intent,
                records,
                skipped,
            } => {
                report.intent = Some(*intent);
                report.records = records.clone();
                report.skipped = skipped.clone();
            }
        }
        report
    }
}

/// Serializable error body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<IntentKind>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<ErrorRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkipNote>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invalid_parameters_report() {
        let err = DispatchError::from(ParamError::new("radius_arcmin", "must be greater than 0"));
        let report = serde_json::to_value(err.report()).unwrap();

        assert_eq!(report["kind"], "invalid_parameters");
        assert_eq!(report["field"], "radius_arcmin");
        assert_eq!(report["message"], "invalid parameters: radius_arcmin: must be greater than 0");
        assert!(report.get("records").is_none());
    }

    #[test]
    fn test_all_failed_report() {
        let err = DispatchError::AllBackendsFailed {
            intent: IntentKind::ByTarget,
            records: vec![ErrorRecord {
                backend: BackendId::Tap,
                intent: IntentKind::ByTarget,
                kind: FailureKind::TimedOut,
                message: "no response within 60s".to_string(),
            }],
            skipped: vec![SkipNote {
                backend: BackendId::Alminer,
                reason: "not configured".to_string(),
            }],
        };
        let report = serde_json::to_value(err.report()).unwrap();

        assert_eq!(report["kind"], "all_backends_failed");
        assert_eq!(report["records"][0]["kind"], "timed_out");
        assert_eq!(report["skipped"][0], json!({"backend": "alminer", "reason": "not configured"}));
        assert_eq!(err.to_string(), "all backends failed for search_by_target");
    }
}
