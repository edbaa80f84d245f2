//! Shared pieces of the two ALMA archive backends

use super::adql::{self, Select};
use super::columns;
use super::traits::BackendError;
use crate::config::BackendConfig;
use crate::network::{HttpClient, TapService};
use crate::results::ResultSet;
use anyhow::{anyhow, Context};

/// ALMA ObsCore table
pub const TABLE: &str = "ivoa.obscore";

/// Columns returned by observation searches
pub const OBSERVATION_COLUMNS: &[&str] = &[
    "target_name",
    "s_ra",
    "s_dec",
    "band_list",
    "proposal_id",
    "frequency",
    "bandwidth",
    "t_exptime",
    "s_resolution",
];

/// Options the loader passes to archive backends
#[derive(Debug, Clone, Copy)]
pub struct ArchiveOptions {
    /// Row limit placed on generated queries
    pub max_rows: u32,
    /// Cone radius in degrees used for line coverage
    pub line_coverage_radius_deg: f64,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            max_rows: 100,
            line_coverage_radius_deg: 0.016,
        }
    }
}

/// Build the TAP client for a backend from its configuration
pub fn connect(client: &HttpClient, config: &BackendConfig) -> anyhow::Result<TapService> {
    let raw = config
        .url
        .as_deref()
        .ok_or_else(|| anyhow!("no TAP url configured for {}", config.name))?;
    let url = url::Url::parse(raw).with_context(|| format!("invalid TAP url '{}'", raw))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow!("unsupported scheme in TAP url '{}'", raw));
    }
    Ok(TapService::new(client.clone(), raw))
}

/// Search radius in degrees
pub fn arcmin_to_deg(radius_arcmin: f64) -> f64 {
    radius_arcmin / 60.0
}

/// Restrict to data whose proprietary period has ended
pub fn public_filter(public_only: bool) -> Option<String> {
    public_only.then(|| "data_rights = 'Public'".to_string())
}

/// Optional target-name substring filter
pub fn target_filter(target_name: &Option<String>) -> Option<String> {
    target_name
        .as_deref()
        .map(|name| adql::contains_ci("target_name", name))
}

/// Optional band filter
pub fn band_filter(band: Option<u8>) -> Option<String> {
    band.map(adql::band_in_list)
}

/// Observation query skeleton
pub fn observations(max_rows: u32) -> Select {
    Select::from(TABLE).top(max_rows).columns(OBSERVATION_COLUMNS.iter().copied())
}

/// Run a query and reconcile its columns
pub async fn run(service: &TapService, query: &Select) -> Result<ResultSet, BackendError> {
    run_adql(service, &query.to_adql()).await
}

/// Run raw ADQL and reconcile its columns
pub async fn run_adql(service: &TapService, adql: &str) -> Result<ResultSet, BackendError> {
    let mut table = service.query(adql).await?;
    columns::reconcile_obscore(&mut table);
    Ok(table)
}

/// Liveness query used by startup probes
pub async fn probe(service: &TapService) -> Result<(), BackendError> {
    service
        .query(&format!("SELECT TOP 1 target_name FROM {}", TABLE))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_requires_url() {
        let client = HttpClient::new().unwrap();
        let config = BackendConfig::named("tap");
        assert!(connect(&client, &config).is_err());

        let config = BackendConfig {
            url: Some("ftp://archive/tap".to_string()),
            ..BackendConfig::named("tap")
        };
        assert!(connect(&client, &config).is_err());

        let config = BackendConfig {
            url: Some(crate::ALMA_TAP_URL.to_string()),
            ..BackendConfig::named("tap")
        };
        assert_eq!(connect(&client, &config).unwrap().base_url(), crate::ALMA_TAP_URL);
    }

    #[test]
    fn test_filters() {
        assert_eq!(public_filter(false), None);
        assert_eq!(public_filter(true).unwrap(), "data_rights = 'Public'");
        assert_eq!(target_filter(&None), None);
        assert_eq!(band_filter(Some(6)).unwrap(), "(' ' || band_list || ' ') LIKE '% 6 %'");
    }
}
