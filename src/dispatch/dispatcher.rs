//! Query dispatch and fallback

use super::batch::{BatchReport, SourceOutcome, SourceResult};
use super::candidates::candidates;
use super::error::{DispatchError, ErrorRecord, FailureKind, SkipNote};
use crate::backends::{Availability, BackendError, BackendId, BackendRegistry};
use crate::config::Settings;
use crate::intents::{Intent, Limits, MultiSourceSearch, ParamError, TargetSearch};
use crate::results::ResultEnvelope;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Successful outcome of [`Dispatcher::handle`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DispatchOutput {
    Envelope(ResultEnvelope),
    Batch(BatchReport),
}

/// Dispatcher that validates intents and tries candidate backends in order
pub struct Dispatcher {
    /// Initialized backends
    registry: Arc<BackendRegistry>,
    /// Startup availability, never modified
    availability: Arc<Availability>,
    limits: Limits,
    /// Timeout for backends without their own
    default_timeout: Duration,
    /// Upper bound on any backend timeout
    max_timeout: Option<Duration>,
    /// Sources of a batch queried at once
    batch_concurrency: usize,
}

impl Dispatcher {
    /// Create a dispatcher over a registry and its availability snapshot
    pub fn new(registry: Arc<BackendRegistry>, availability: Availability) -> Self {
        Self {
            registry,
            availability: Arc::new(availability),
            limits: Limits::default(),
            default_timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT),
            max_timeout: None,
            batch_concurrency: 4,
        }
    }

    /// Create a dispatcher configured from settings
    pub fn from_settings(
        registry: Arc<BackendRegistry>,
        availability: Availability,
        settings: &Settings,
    ) -> Self {
        let dispatcher = Self::new(registry, availability)
            .with_limits(Limits {
                batch_max_sources: settings.dispatch.batch_max_sources,
                ..Limits::default()
            })
            .with_timeout(Duration::from_secs_f64(settings.outgoing.request_timeout))
            .with_batch_concurrency(settings.dispatch.batch_concurrency);

        match settings.outgoing.max_request_timeout {
            Some(max) => dispatcher.with_max_timeout(Duration::from_secs_f64(max)),
            None => dispatcher,
        }
    }

    /// Set parameter limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set default timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Set maximum timeout
    pub fn with_max_timeout(mut self, timeout: Duration) -> Self {
        self.max_timeout = Some(timeout);
        self
    }

    /// Set batch concurrency
    pub fn with_batch_concurrency(mut self, concurrency: usize) -> Self {
        self.batch_concurrency = concurrency.max(1);
        self
    }

    pub fn availability(&self) -> &Availability {
        &self.availability
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Handle any intent; batches produce a [`BatchReport`]
    pub async fn handle(&self, intent: &Intent) -> Result<DispatchOutput, DispatchError> {
        match intent {
            Intent::MultiSource(search) => self.dispatch_batch(search).await.map(DispatchOutput::Batch),
            other => self.dispatch(other).await.map(DispatchOutput::Envelope),
        }
    }

    /// Dispatch a single intent through its candidate backends
    pub async fn dispatch(&self, intent: &Intent) -> Result<ResultEnvelope, DispatchError> {
        let span = info_span!("dispatch", request_id = %Uuid::new_v4(), intent = %intent.kind());
        self.try_candidates(intent).instrument(span).await
    }

    async fn try_candidates(&self, intent: &Intent) -> Result<ResultEnvelope, DispatchError> {
        intent.validate(&self.limits)?;
        if let Intent::MultiSource(_) = intent {
            return Err(ParamError::new("source_names", "batches are dispatched per source").into());
        }

        let kind = intent.kind();
        let start = Instant::now();
        let mut warnings = Vec::new();
        let mut records = Vec::new();
        let mut skipped = Vec::new();

        for &id in candidates(kind) {
            let backend = match self.registry.get(id) {
                Some(backend) if self.availability.is_available(id) => backend,
                _ => {
                    let note = SkipNote {
                        backend: id,
                        reason: format!("unavailable ({})", self.availability.reason(id)),
                    };
                    debug!("{}", note);
                    warnings.push(note.to_string());
                    skipped.push(note);
                    continue;
                }
            };

            let limit = self.timeout_for(id);
            debug!("Trying {} with timeout {:?}", id, limit);

            let record = match timeout(limit, backend.execute(intent)).await {
                Ok(Ok(table)) => {
                    let elapsed = start.elapsed();
                    info!("{} answered {} with {} rows in {:?}", id, kind, table.len(), elapsed);
                    return Ok(ResultEnvelope::from_result_set(
                        kind,
                        id,
                        table,
                        warnings,
                        elapsed.as_millis() as u64,
                    ));
                }
                Ok(Err(e)) => ErrorRecord {
                    backend: id,
                    intent: kind,
                    kind: match e {
                        BackendError::Unavailable(_) => FailureKind::Unavailable,
                        BackendError::QueryFailed(_) => FailureKind::QueryFailed,
                    },
                    message: e.to_string(),
                },
                Err(_) => ErrorRecord {
                    backend: id,
                    intent: kind,
                    kind: FailureKind::TimedOut,
                    message: format!("no response within {:?}", limit),
                },
            };

            warn!("{}", record);
            warnings.push(record.to_string());
            records.push(record);
        }

        warn!("All backends failed for {}", kind);
        Err(DispatchError::AllBackendsFailed {
            intent: kind,
            records,
            skipped,
        })
    }

    /// Run one by-target dispatch per distinct source
    ///
    /// Fails only on invalid parameters; a source whose dispatch fails is
    /// reported in its own entry.
    pub async fn dispatch_batch(&self, search: &MultiSourceSearch) -> Result<BatchReport, DispatchError> {
        Intent::MultiSource(search.clone()).validate(&self.limits)?;

        let sources = search.unique_sources();
        info!(
            "Dispatching batch of {} sources (concurrency {})",
            sources.len(),
            self.batch_concurrency
        );

        let results = stream::iter(sources)
            .map(|source_name| async move {
                let intent = Intent::ByTarget(TargetSearch {
                    target_name: source_name.clone(),
                    radius_arcmin: search.radius_arcmin,
                    public_only: true,
                });
                let outcome = match self.dispatch(&intent).await {
                    Ok(result) => SourceOutcome::Ok { result },
                    Err(e) => {
                        warn!("Batch source {} failed: {}", source_name, e);
                        SourceOutcome::Failed { error: e.report() }
                    }
                };
                SourceResult {
                    source_name,
                    outcome,
                }
            })
            .buffered(self.batch_concurrency)
            .collect::<Vec<_>>()
            .await;

        Ok(BatchReport::new(results))
    }

    fn timeout_for(&self, id: BackendId) -> Duration {
        let secs = self.registry.get_timeout(
            id,
            self.default_timeout.as_secs_f64(),
            self.max_timeout.map(|d| d.as_secs_f64()),
        );
        Duration::from_secs_f64(secs.max(0.0))
    }
}
