//! Startup availability snapshot
//!
//! Computed once when backends are loaded and never changed afterwards; the
//! dispatcher consults it to skip backends without calling them.

use super::traits::BackendId;
use crate::intents::IntentKind;
use serde::Serialize;
use std::collections::BTreeMap;

/// Availability of one backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendStatus {
    pub available: bool,
    /// Why the backend is unavailable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Intents the backend serves
    pub intents: Vec<IntentKind>,
}

/// Immutable availability of every known backend
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Availability {
    backends: BTreeMap<BackendId, BackendStatus>,
}

impl Availability {
    /// Start a snapshot where nothing is available
    pub fn builder() -> AvailabilityBuilder {
        AvailabilityBuilder::default()
    }

    /// Whether a backend initialized successfully
    pub fn is_available(&self, id: BackendId) -> bool {
        self.backends.get(&id).map(|s| s.available).unwrap_or(false)
    }

    /// Status of one backend; unknown backends have none
    pub fn status(&self, id: BackendId) -> Option<&BackendStatus> {
        self.backends.get(&id)
    }

    /// Reason recorded for an unavailable backend
    pub fn reason(&self, id: BackendId) -> String {
        self.backends
            .get(&id)
            .and_then(|s| s.reason.clone())
            .unwrap_or_else(|| "not configured".to_string())
    }

    /// All statuses in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (BackendId, &BackendStatus)> {
        self.backends.iter().map(|(id, s)| (*id, s))
    }

    /// Identifiers of available backends
    pub fn available(&self) -> Vec<BackendId> {
        self.iter()
            .filter(|(_, s)| s.available)
            .map(|(id, _)| id)
            .collect()
    }
}

/// Builder consumed into a frozen [`Availability`]
#[derive(Debug, Default)]
pub struct AvailabilityBuilder {
    backends: BTreeMap<BackendId, BackendStatus>,
}

impl AvailabilityBuilder {
    pub fn available(mut self, id: BackendId, intents: &[IntentKind]) -> Self {
        self.backends.insert(
            id,
            BackendStatus {
                available: true,
                reason: None,
                intents: intents.to_vec(),
            },
        );
        self
    }

    pub fn unavailable(mut self, id: BackendId, reason: impl Into<String>) -> Self {
        self.backends.insert(
            id,
            BackendStatus {
                available: false,
                reason: Some(reason.into()),
                intents: Vec::new(),
            },
        );
        self
    }

    pub fn build(mut self) -> Availability {
        for id in BackendId::ALL {
            self.backends.entry(id).or_insert_with(|| BackendStatus {
                available: false,
                reason: Some("not configured".to_string()),
                intents: Vec::new(),
            });
        }
        Availability {
            backends: self.backends,
        }
    }
}
