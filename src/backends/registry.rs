//! Registry of initialized backends

use super::traits::{Backend, BackendId};
use crate::config::BackendConfig;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of all initialized backends
pub struct BackendRegistry {
    /// Backends by identifier
    backends: HashMap<BackendId, Arc<dyn Backend>>,
    /// Backend configurations
    configs: HashMap<BackendId, BackendConfig>,
}

impl BackendRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            configs: HashMap::new(),
        }
    }

    /// Register a backend
    pub fn register(&mut self, backend: Arc<dyn Backend>, config: BackendConfig) {
        let id = backend.id();
        self.backends.insert(id, backend);
        self.configs.insert(id, config);
    }

    /// Get a backend by identifier
    pub fn get(&self, id: BackendId) -> Option<&Arc<dyn Backend>> {
        self.backends.get(&id)
    }

    /// Get backend config
    pub fn get_config(&self, id: BackendId) -> Option<&BackendConfig> {
        self.configs.get(&id)
    }

    /// Registered identifiers, in canonical order
    pub fn ids(&self) -> Vec<BackendId> {
        BackendId::ALL
            .into_iter()
            .filter(|id| self.backends.contains_key(id))
            .collect()
    }

    /// Check if a backend is registered
    pub fn contains(&self, id: BackendId) -> bool {
        self.backends.contains_key(&id)
    }

    /// Get number of registered backends
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Effective timeout in seconds: configured, else the backend's own,
    /// else `default`; never above `max` when one is set
    pub fn get_timeout(&self, id: BackendId, default: f64, max: Option<f64>) -> f64 {
        let timeout = self
            .configs
            .get(&id)
            .and_then(|c| c.timeout)
            .or_else(|| self.backends.get(&id).map(|b| b.timeout()))
            .unwrap_or(default);

        match max {
            Some(max) => timeout.min(max),
            None => timeout,
        }
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::Reference;

    #[test]
    fn test_registry() {
        let mut registry = BackendRegistry::new();
        registry.register(Arc::new(Reference::new()), BackendConfig::named("reference"));

        assert!(registry.contains(BackendId::Reference));
        assert!(!registry.contains(BackendId::Tap));
        assert_eq!(registry.ids(), vec![BackendId::Reference]);
    }

    #[test]
    fn test_timeout_resolution() {
        let mut registry = BackendRegistry::new();
        registry.register(Arc::new(Reference::new()), BackendConfig::named("reference"));
        assert_eq!(registry.get_timeout(BackendId::Reference, 30.0, None), 1.0);

        let config = BackendConfig {
            timeout: Some(300.0),
            ..BackendConfig::named("reference")
        };
        registry.register(Arc::new(Reference::new()), config);
        assert_eq!(registry.get_timeout(BackendId::Reference, 30.0, Some(120.0)), 120.0);

        assert_eq!(registry.get_timeout(BackendId::Tap, 30.0, None), 30.0);
    }
}
