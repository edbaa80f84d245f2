//! Settings structures for ALMA-Archive-RS configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Main settings structure matching settings.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub outgoing: OutgoingSettings,
    pub dispatch: DispatchSettings,
    pub backends: Vec<BackendConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            server: ServerSettings::default(),
            outgoing: OutgoingSettings::default(),
            dispatch: DispatchSettings::default(),
            backends: default_backends(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the HTTP client and dispatcher cannot work with
    pub fn validate(&self) -> Result<()> {
        check_timeout("outgoing.request_timeout", self.outgoing.request_timeout)?;
        if let Some(max) = self.outgoing.max_request_timeout {
            check_timeout("outgoing.max_request_timeout", max)?;
        }
        for backend in &self.backends {
            if let Some(timeout) = backend.timeout {
                check_timeout(&format!("backends.{}.timeout", backend.name), timeout)?;
            }
        }
        Ok(())
    }

    /// Merge with environment variables (ALMA_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    fn merge_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("ALMA_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Some(val) = var("ALMA_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("ALMA_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(val) = var("ALMA_TAP_URL") {
            for backend in self
                .backends
                .iter_mut()
                .filter(|b| b.backend == "tap" || b.backend == "alminer")
            {
                backend.url = Some(val.clone());
            }
        }
        if let Some(val) = var("ALMA_SIMBAD_URL") {
            for backend in self.backends.iter_mut().filter(|b| b.backend == "simbad") {
                backend.url = Some(val.clone());
            }
        }
    }

    /// Get backend config by name
    pub fn get_backend(&self, name: &str) -> Option<&BackendConfig> {
        self.backends.iter().find(|b| b.name == name)
    }

    /// Get all enabled backends
    pub fn enabled_backends(&self) -> Vec<&BackendConfig> {
        self.backends.iter().filter(|b| !b.disabled).collect()
    }
}

fn check_timeout(field: &str, seconds: f64) -> Result<()> {
    if !seconds.is_finite() || seconds <= 0.0 {
        bail!("{} must be a positive number of seconds, got {}", field, seconds);
    }
    Ok(())
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Instance name reported by the protocol handshake
    pub instance_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "ALMA Archive Server".to_string(),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8765,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Upper bound for any per-backend timeout
    pub max_request_timeout: Option<f64>,
    /// User agent sent to archive services
    pub user_agent: String,
    /// Pool max idle connections per host
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Process-wide outbound request budget (none = unlimited)
    pub requests_per_second: Option<u32>,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 30.0,
            max_request_timeout: Some(120.0),
            user_agent: format!("alma-archive-rs/{}", crate::VERSION),
            pool_maxsize: 8,
            verify_ssl: true,
            requests_per_second: None,
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Dispatcher behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    /// Row limit placed on generated archive queries
    pub max_rows: u32,
    /// Maximum number of sources accepted by a batch query
    pub batch_max_sources: usize,
    /// Number of batch sources dispatched concurrently
    pub batch_concurrency: usize,
    /// Cone radius (degrees) used when checking line coverage around a target
    pub line_coverage_radius_deg: f64,
    /// Run a lightweight probe query against each backend at startup
    pub probe_on_startup: bool,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            max_rows: 100,
            batch_max_sources: 20,
            batch_concurrency: 4,
            line_coverage_radius_deg: 0.016,
            probe_on_startup: false,
        }
    }
}

/// Individual backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend name (unique identifier)
    pub name: String,
    /// Backend adapter to use
    pub backend: String,
    /// Whether the backend is disabled
    pub disabled: bool,
    /// Custom timeout for this backend in seconds
    pub timeout: Option<f64>,
    /// Service base URL (TAP root for archive services)
    pub url: Option<String>,
    /// Additional backend-specific settings
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            backend: String::new(),
            disabled: false,
            timeout: None,
            url: None,
            extra: HashMap::new(),
        }
    }
}

impl BackendConfig {
    /// Create a config entry for a backend of the same name
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            backend: name.to_string(),
            ..Default::default()
        }
    }
}

/// Default backend configurations
fn default_backends() -> Vec<BackendConfig> {
    vec![
        BackendConfig {
            url: Some(crate::ALMA_TAP_URL.to_string()),
            timeout: Some(60.0),
            ..BackendConfig::named("alminer")
        },
        BackendConfig {
            url: Some(crate::ALMA_TAP_URL.to_string()),
            timeout: Some(60.0),
            ..BackendConfig::named("tap")
        },
        BackendConfig {
            url: Some(crate::SIMBAD_TAP_URL.to_string()),
            timeout: Some(15.0),
            ..BackendConfig::named("simbad")
        },
        BackendConfig::named("reference"),
    ]
}
