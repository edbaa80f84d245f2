//! Application state shared across handlers

use crate::config::Settings;
use crate::dispatch::Dispatcher;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Query dispatcher
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings, dispatcher: Dispatcher) -> Self {
        Self {
            settings: Arc::new(settings),
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }
}
