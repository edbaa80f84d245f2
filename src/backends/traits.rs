//! Backend traits and types

use crate::config::BackendConfig;
use crate::intents::{Intent, IntentKind};
use crate::network::TapError;
use crate::results::ResultSet;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Identifier of one of the fixed set of backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendId {
    /// Domain query layer over the ALMA archive (cone/key search, line coverage)
    Alminer,
    /// Raw ADQL against the ALMA TAP service
    Tap,
    /// SIMBAD name resolver
    Simbad,
    /// Built-in ALMA reference facts
    Reference,
}

impl BackendId {
    pub const ALL: [BackendId; 4] = [
        BackendId::Alminer,
        BackendId::Tap,
        BackendId::Simbad,
        BackendId::Reference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alminer => "alminer",
            Self::Tap => "tap",
            Self::Simbad => "simbad",
            Self::Reference => "reference",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == name)
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single backend call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend did not initialize at startup
    #[error("backend {0} is unavailable")]
    Unavailable(BackendId),
    /// Runtime failure, carrying the backend's own error text
    #[error("{0}")]
    QueryFailed(String),
}

impl BackendError {
    pub fn query_failed(reason: impl Into<String>) -> Self {
        Self::QueryFailed(reason.into())
    }
}

impl From<TapError> for BackendError {
    fn from(err: TapError) -> Self {
        Self::QueryFailed(err.to_string())
    }
}

/// Resolved ICRS position of a named object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Name the resolver knows the object by
    pub main_id: String,
    pub ra_deg: f64,
    pub dec_deg: f64,
}

/// Turns object names into coordinates
#[async_trait]
pub trait TargetResolver: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<Coordinates, BackendError>;
}

/// Resolver handle shared by archive backends
pub type SharedResolver = Option<Arc<dyn TargetResolver>>;

/// Resolve a name, failing cleanly when no resolver was wired in
pub async fn resolve_target(
    resolver: &SharedResolver,
    name: &str,
) -> Result<Coordinates, BackendError> {
    match resolver {
        Some(resolver) => resolver.resolve(name).await,
        None => Err(BackendError::query_failed(
            "target name resolution unavailable",
        )),
    }
}

/// Backend metadata
#[derive(Debug, Clone, Default, Serialize)]
pub struct BackendAbout {
    /// Service URL
    pub website: Option<String>,
    /// Whether it speaks a standard protocol (TAP)
    pub standard_protocol: bool,
    /// Short description
    pub description: String,
}

impl BackendAbout {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn website(mut self, url: impl Into<String>) -> Self {
        self.website = Some(url.into());
        self
    }

    pub fn standard_protocol(mut self, standard: bool) -> Self {
        self.standard_protocol = standard;
        self
    }
}

/// Main trait every backend adapter implements
///
/// `execute` receives an intent that the dispatcher has already validated and
/// returns rows whose column names follow [`crate::backends::columns`].
#[async_trait]
pub trait Backend: Send + Sync {
    /// Backend identifier
    fn id(&self) -> BackendId;

    /// Short description of the backend
    fn about(&self) -> BackendAbout {
        BackendAbout::default()
    }

    /// Intents this backend can serve
    fn intents(&self) -> &[IntentKind];

    /// Whether this backend can serve an intent kind
    fn supports(&self, kind: IntentKind) -> bool {
        self.intents().contains(&kind)
    }

    /// Default timeout in seconds
    fn timeout(&self) -> f64 {
        30.0
    }

    /// Whether initialization succeeded
    fn is_ready(&self) -> bool {
        true
    }

    /// Initialization from configuration (called once on startup)
    fn init(&mut self, _config: &BackendConfig) -> anyhow::Result<()> {
        Ok(())
    }

    /// Optional liveness check run at startup when probing is enabled
    async fn probe(&self) -> Result<(), BackendError> {
        Ok(())
    }

    /// Run one intent
    async fn execute(&self, intent: &Intent) -> Result<ResultSet, BackendError>;
}

/// Error for an intent the backend was asked to serve but cannot
pub fn unsupported(backend: BackendId, intent: &Intent) -> BackendError {
    BackendError::query_failed(format!(
        "{} does not support {}",
        backend,
        intent.kind()
    ))
}
