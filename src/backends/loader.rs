//! Backend loader for initializing backends from configuration

use super::alminer::Alminer;
use super::availability::Availability;
use super::obscore::ArchiveOptions;
use super::reference::Reference;
use super::registry::BackendRegistry;
use super::simbad::Simbad;
use super::tap::Tap;
use super::traits::{Backend, BackendId, SharedResolver, TargetResolver};
use crate::config::{BackendConfig, Settings};
use crate::network::HttpClient;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Backends loaded at startup with their availability snapshot
pub struct LoadedBackends {
    pub registry: BackendRegistry,
    pub availability: Availability,
}

/// Loader for initializing backends from configuration
pub struct BackendLoader;

impl BackendLoader {
    /// Load every configured backend
    ///
    /// A backend that is disabled, misconfigured or fails its startup probe is
    /// recorded as unavailable; loading itself never fails because of one.
    pub async fn load(settings: &Settings, client: &HttpClient) -> Result<LoadedBackends> {
        let configs = Self::configs_by_id(settings);
        let mut registry = BackendRegistry::new();
        let mut builder = Availability::builder();

        // Only a simbad that passed its startup check resolves names
        let mut resolver: SharedResolver = None;
        if let Some(config) = configs.get(&BackendId::Simbad).copied() {
            let mut simbad = Simbad::new(client.clone());
            match simbad.init(config) {
                Ok(()) => {
                    let simbad = Arc::new(simbad);
                    match Self::startup_check(settings, &*simbad).await {
                        Ok(()) => {
                            info!("Loaded backend: {} ({})", config.name, BackendId::Simbad);
                            builder = builder.available(BackendId::Simbad, simbad.intents());
                            resolver = Some(simbad.clone() as Arc<dyn TargetResolver>);
                        }
                        Err(reason) => {
                            warn!("Backend {} unavailable: {}", config.name, reason);
                            builder = builder.unavailable(BackendId::Simbad, reason);
                        }
                    }
                    registry.register(simbad, config.clone());
                }
                Err(e) => {
                    warn!("Failed to load backend {}: {}", config.name, e);
                    builder = builder.unavailable(BackendId::Simbad, e.to_string());
                }
            }
        }

        let options = ArchiveOptions {
            max_rows: settings.dispatch.max_rows,
            line_coverage_radius_deg: settings.dispatch.line_coverage_radius_deg,
        };

        for id in [BackendId::Alminer, BackendId::Tap, BackendId::Reference] {
            let Some(config) = configs.get(&id).copied() else {
                continue;
            };
            let backend = match Self::create_backend(id, config, client, &resolver, options) {
                Ok(backend) => backend,
                Err(e) => {
                    warn!("Failed to load backend {}: {}", config.name, e);
                    builder = builder.unavailable(id, e.to_string());
                    continue;
                }
            };
            match Self::startup_check(settings, backend.as_ref()).await {
                Ok(()) => {
                    info!("Loaded backend: {} ({})", config.name, id);
                    builder = builder.available(id, backend.intents());
                }
                Err(reason) => {
                    warn!("Backend {} unavailable: {}", config.name, reason);
                    builder = builder.unavailable(id, reason);
                }
            }
            registry.register(backend, config.clone());
        }

        for config in &settings.backends {
            if config.disabled {
                if let Some(id) = BackendId::from_name(&config.backend) {
                    if !registry.contains(id) {
                        builder = builder.unavailable(id, "disabled in configuration");
                    }
                }
            }
        }

        let availability = builder.build();
        info!(
            "Loaded {} backends, available: {:?}",
            registry.len(),
            availability.available()
        );

        Ok(LoadedBackends {
            registry,
            availability,
        })
    }

    /// Run the startup probe when enabled
    async fn startup_check(settings: &Settings, backend: &dyn Backend) -> Result<(), String> {
        if !settings.dispatch.probe_on_startup {
            return Ok(());
        }
        backend
            .probe()
            .await
            .map_err(|e| format!("startup probe failed: {}", e))
    }

    /// Enabled configurations keyed by backend; the first entry for a backend wins
    fn configs_by_id(settings: &Settings) -> HashMap<BackendId, &BackendConfig> {
        let mut configs = HashMap::new();
        for config in &settings.backends {
            if config.disabled {
                info!("Skipping disabled backend: {}", config.name);
                continue;
            }
            match BackendId::from_name(&config.backend) {
                Some(id) if configs.contains_key(&id) => {
                    warn!("Ignoring duplicate configuration {} for backend {}", config.name, id);
                }
                Some(id) => {
                    configs.insert(id, config);
                }
                None => warn!("Unknown backend type: {}", config.backend),
            }
        }
        configs
    }

    /// Create and initialize a backend instance
    fn create_backend(
        id: BackendId,
        config: &BackendConfig,
        client: &HttpClient,
        resolver: &SharedResolver,
        options: ArchiveOptions,
    ) -> Result<Arc<dyn Backend>> {
        let mut backend: Box<dyn Backend> = match id {
            BackendId::Alminer => Box::new(Alminer::new(client.clone(), resolver.clone(), options)),
            BackendId::Tap => Box::new(Tap::new(client.clone(), resolver.clone(), options)),
            BackendId::Reference => Box::new(Reference::new()),
            BackendId::Simbad => {
                return Err(anyhow!("simbad is loaded as the target resolver"));
            }
        };

        backend.init(config)?;

        Ok(Arc::from(backend))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intents::{Intent, TargetSearch};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings_with(backends: Vec<BackendConfig>) -> Settings {
        Settings {
            backends,
            ..Settings::default()
        }
    }

    fn config(backend: &str, url: Option<String>) -> BackendConfig {
        BackendConfig {
            url,
            ..BackendConfig::named(backend)
        }
    }

    #[tokio::test]
    async fn test_default_settings_load_all() {
        let loaded = BackendLoader::load(&Settings::default(), &HttpClient::new().unwrap())
            .await
            .unwrap();

        assert_eq!(loaded.registry.len(), 4);
        for id in BackendId::ALL {
            assert!(loaded.availability.is_available(id), "{} unavailable", id);
        }
    }

    #[tokio::test]
    async fn test_bad_url_makes_backend_unavailable() {
        let settings = settings_with(vec![
            config("tap", Some("not a url".to_string())),
            config("reference", None),
        ]);
        let loaded = BackendLoader::load(&settings, &HttpClient::new().unwrap())
            .await
            .unwrap();

        assert!(!loaded.availability.is_available(BackendId::Tap));
        assert!(loaded.availability.reason(BackendId::Tap).contains("invalid TAP url"));
        assert!(loaded.availability.is_available(BackendId::Reference));
        assert!(!loaded.registry.contains(BackendId::Tap));
    }

    #[tokio::test]
    async fn test_disabled_backend() {
        let mut tap = config("tap", Some(crate::ALMA_TAP_URL.to_string()));
        tap.disabled = true;
        let loaded = BackendLoader::load(&settings_with(vec![tap]), &HttpClient::new().unwrap())
            .await
            .unwrap();

        assert!(loaded.registry.is_empty());
        assert_eq!(loaded.availability.reason(BackendId::Tap), "disabled in configuration");
        assert_eq!(loaded.availability.reason(BackendId::Alminer), "not configured");
    }

    #[tokio::test]
    async fn test_failed_probe_marks_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let mut settings = settings_with(vec![
            config("tap", Some(format!("{}/tap", server.uri()))),
            config("reference", None),
        ]);
        settings.dispatch.probe_on_startup = true;
        let loaded = BackendLoader::load(&settings, &HttpClient::new().unwrap())
            .await
            .unwrap();

        assert!(!loaded.availability.is_available(BackendId::Tap));
        assert!(loaded.availability.reason(BackendId::Tap).starts_with("startup probe failed"));
        assert!(loaded.availability.is_available(BackendId::Reference));
    }

    #[tokio::test]
    async fn test_unreachable_simbad_is_not_wired_as_resolver() {
        let simbad_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .mount(&simbad_server)
            .await;
        let tap_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("target_name\n"))
            .mount(&tap_server)
            .await;

        let mut settings = settings_with(vec![
            config("simbad", Some(simbad_server.uri())),
            config("tap", Some(format!("{}/tap", tap_server.uri()))),
        ]);
        settings.dispatch.probe_on_startup = true;
        let loaded = BackendLoader::load(&settings, &HttpClient::new().unwrap())
            .await
            .unwrap();

        assert!(!loaded.availability.is_available(BackendId::Simbad));
        assert!(loaded.availability.is_available(BackendId::Tap));

        let tap = loaded.registry.get(BackendId::Tap).unwrap();
        let intent = Intent::ByTarget(TargetSearch {
            target_name: "M87".to_string(),
            radius_arcmin: 1.0,
            public_only: true,
        });
        let err = tap.execute(&intent).await.unwrap_err();
        assert_eq!(err.to_string(), "target name resolution unavailable");

        // Only the startup check reached simbad
        let requests = simbad_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }
}
