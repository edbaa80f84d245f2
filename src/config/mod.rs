//! Configuration module for ALMA-Archive-RS
//!
//! Handles loading settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use anyhow::{bail, Result};
use std::path::PathBuf;
use tracing::info;

/// Environment variable naming an explicit settings file
pub const SETTINGS_PATH_VAR: &str = "ALMA_SETTINGS_PATH";

/// Default locations searched for settings.yml, in order
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
        PathBuf::from("/etc/alma-archive/settings.yml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("alma-archive-rs/settings.yml"));
    }
    paths
}

/// Load settings from an explicit path, the environment, a default
/// location, or fall back to built-in defaults
///
/// A path given explicitly or through `ALMA_SETTINGS_PATH` must exist.
pub fn load(explicit: Option<PathBuf>) -> Result<Settings> {
    let named = explicit.or_else(|| std::env::var(SETTINGS_PATH_VAR).ok().map(PathBuf::from));

    let mut settings = match named {
        Some(path) => {
            if !path.exists() {
                bail!("config file not found: {}", path.display());
            }
            info!("Loading settings from: {}", path.display());
            Settings::from_file(&path)?
        }
        None => match search_paths().into_iter().find(|p| p.exists()) {
            Some(path) => {
                info!("Loading settings from: {}", path.display());
                Settings::from_file(&path)?
            }
            None => {
                info!("No settings file found, using defaults");
                Settings::default()
            }
        },
    };

    settings.merge_env();
    settings.validate()?;
    Ok(settings)
}
