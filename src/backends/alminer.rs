//! Domain query layer over the ALMA archive
//!
//! Serves the intents that benefit from archive-specific knowledge: cone
//! searches around resolved targets, keyword searches on proposal metadata
//! and line coverage checked against each dataset's spectral windows.

use super::adql::{self, Select};
use super::obscore::{self, ArchiveOptions};
use super::spectral;
use super::traits::*;
use crate::config::BackendConfig;
use crate::intents::*;
use crate::network::{HttpClient, TapService};
use crate::results::ResultSet;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

const INTENTS: &[IntentKind] = &[
    IntentKind::ByTarget,
    IntentKind::ByPosition,
    IntentKind::ByProposal,
    IntentKind::LineCoverage,
];

const SUPPORT_COLUMN: &str = "frequency_support";

/// Archive-aware ALMA backend
pub struct Alminer {
    client: HttpClient,
    service: Option<TapService>,
    resolver: SharedResolver,
    options: ArchiveOptions,
}

impl Alminer {
    pub fn new(client: HttpClient, resolver: SharedResolver, options: ArchiveOptions) -> Self {
        Self {
            client,
            service: None,
            resolver,
            options,
        }
    }

    fn service(&self) -> Result<&TapService, BackendError> {
        self.service
            .as_ref()
            .ok_or(BackendError::Unavailable(BackendId::Alminer))
    }

    async fn conesearch(&self, ra: f64, dec: f64, radius_deg: f64, public_only: bool) -> Result<ResultSet, BackendError> {
        let query = conesearch_query(ra, dec, radius_deg, public_only, self.options.max_rows);
        obscore::run(self.service()?, &query).await
    }

    async fn line_coverage(&self, p: &LineCoverageSearch) -> Result<ResultSet, BackendError> {
        let coords = resolve_target(&self.resolver, &p.target_name).await?;
        let observed = p.observed_frequency_ghz();

        let query = conesearch_query(
            coords.ra_deg,
            coords.dec_deg,
            self.options.line_coverage_radius_deg,
            true,
            self.options.max_rows,
        )
        .column(SUPPORT_COLUMN);
        let all = obscore::run(self.service()?, &query).await?;
        let total = all.len();
        let covering = covering_rows(all, observed);

        debug!(
            "{} of {} observations of {} cover {} GHz",
            covering.len(),
            total,
            p.target_name,
            observed
        );

        let summary = if total == 0 {
            format!("No ALMA observations found for {}", p.target_name)
        } else if covering.is_empty() {
            format!(
                "None of the {} observations cover {} GHz at z={}",
                total, p.line_frequency_ghz, p.redshift
            )
        } else {
            format!("{} of {} observations cover the line", covering.len(), total)
        };
        let covering_count = covering.len();

        Ok(covering
            .with_summary(summary)
            .with_meta("target_resolved_to", json!(coords))
            .with_meta("total_observations", total)
            .with_meta("covering_line", covering_count)
            .with_meta("line_frequency_ghz", p.line_frequency_ghz)
            .with_meta("redshift", p.redshift)
            .with_meta("observed_frequency_ghz", round4(observed)))
    }
}

#[async_trait]
impl Backend for Alminer {
    fn id(&self) -> BackendId {
        BackendId::Alminer
    }

    fn about(&self) -> BackendAbout {
        BackendAbout::new("Cone and keyword searches of the ALMA archive with spectral coverage checks")
            .website("https://alminer.readthedocs.io")
    }

    fn intents(&self) -> &[IntentKind] {
        INTENTS
    }

    fn timeout(&self) -> f64 {
        60.0
    }

    fn is_ready(&self) -> bool {
        self.service.is_some()
    }

    fn init(&mut self, config: &BackendConfig) -> anyhow::Result<()> {
        self.service = Some(obscore::connect(&self.client, config)?);
        Ok(())
    }

    async fn probe(&self) -> Result<(), BackendError> {
        obscore::probe(self.service()?).await
    }

    async fn execute(&self, intent: &Intent) -> Result<ResultSet, BackendError> {
        self.service()?;

        match intent {
            Intent::ByTarget(p) => {
                let coords = resolve_target(&self.resolver, &p.target_name).await?;
                let table = self
                    .conesearch(
                        coords.ra_deg,
                        coords.dec_deg,
                        obscore::arcmin_to_deg(p.radius_arcmin),
                        p.public_only,
                    )
                    .await?;
                let summary = if table.is_empty() {
                    format!("No ALMA observations found for {}", p.target_name)
                } else {
                    format!("Found {} ALMA observations for {}", table.len(), p.target_name)
                };
                Ok(table
                    .with_summary(summary)
                    .with_meta("target_resolved_to", json!(coords)))
            }
            Intent::ByPosition(p) => {
                let table = self
                    .conesearch(
                        p.ra_degrees,
                        p.dec_degrees,
                        obscore::arcmin_to_deg(p.radius_arcmin),
                        p.public_only,
                    )
                    .await?;
                let summary = format!(
                    "Found {} ALMA observations near RA={:.4}, Dec={:.4}",
                    table.len(),
                    p.ra_degrees,
                    p.dec_degrees
                );
                Ok(table.with_summary(summary))
            }
            Intent::ByProposal(p) => {
                let table = obscore::run(self.service()?, &keysearch_query(p, self.options.max_rows)).await?;
                let summary = if table.is_empty() {
                    "No matching observations found".to_string()
                } else {
                    format!("Found {} observations matching criteria", table.len())
                };
                Ok(table.with_summary(summary))
            }
            Intent::LineCoverage(p) => self.line_coverage(p).await,
            other => Err(unsupported(BackendId::Alminer, other)),
        }
    }
}

/// Cone search with the PI and category columns alminer reports
pub(crate) fn conesearch_query(ra: f64, dec: f64, radius_deg: f64, public_only: bool, rows: u32) -> Select {
    obscore::observations(rows)
        .columns(["obs_creator_name", "scientific_category"])
        .filter(adql::cone(ra, dec, radius_deg))
        .filter_opt(obscore::public_filter(public_only))
}

/// Keyword search on proposal metadata; public data only
pub(crate) fn keysearch_query(p: &ProposalSearch, rows: u32) -> Select {
    Select::from(obscore::TABLE)
        .top(rows)
        .columns([
            "target_name",
            "s_ra",
            "s_dec",
            "band_list",
            "proposal_id",
            "obs_creator_name",
            "scientific_category",
        ])
        .filter_opt(p.proposal_id.as_deref().map(|id| adql::contains("proposal_id", id)))
        .filter_opt(p.pi_name.as_deref().map(|pi| adql::contains_ci("obs_creator_name", pi)))
        .filter_opt(
            p.science_category
                .as_deref()
                .map(|c| adql::contains_ci("scientific_category", c)),
        )
        .filter_opt(obscore::public_filter(true))
}

/// Keep rows whose spectral windows contain the frequency
fn covering_rows(mut table: ResultSet, frequency_ghz: f64) -> ResultSet {
    table.rows.retain(|row| {
        row.get(SUPPORT_COLUMN)
            .and_then(Value::as_str)
            .map(|support| spectral::covers(support, frequency_ghz))
            .unwrap_or(false)
    });
    table
}

fn round4(value: f64) -> f64 {
    (value * 1e4).round() / 1e4
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedResolver;

    #[async_trait]
    impl TargetResolver for FixedResolver {
        async fn resolve(&self, name: &str) -> Result<Coordinates, BackendError> {
            Ok(Coordinates {
                main_id: name.to_string(),
                ra_deg: 83.8221,
                dec_deg: -5.3911,
            })
        }
    }

    async fn backend_for(server: &MockServer) -> Alminer {
        let mut alminer = Alminer::new(
            HttpClient::new().unwrap(),
            Some(Arc::new(FixedResolver)),
            ArchiveOptions::default(),
        );
        alminer
            .init(&BackendConfig {
                url: Some(format!("{}/tap", server.uri())),
                ..BackendConfig::named("alminer")
            })
            .unwrap();
        alminer
    }

    #[test]
    fn test_keysearch_is_public_only() {
        let p = ProposalSearch {
            pi_name: Some("Smith".to_string()),
            ..Default::default()
        };
        let sql = keysearch_query(&p, 100).to_adql();
        assert!(sql.contains("LOWER(obs_creator_name) LIKE '%smith%'"));
        assert!(sql.ends_with("data_rights = 'Public'"));
        assert!(!sql.contains("proposal_id LIKE"));
    }

    #[test]
    fn test_conesearch_radius_in_degrees() {
        let sql = conesearch_query(83.8221, -5.3911, 0.016, false, 100).to_adql();
        assert!(sql.contains("CIRCLE('ICRS', 83.8221, -5.3911, 0.016)"));
        assert!(!sql.contains("data_rights"));
    }

    #[test]
    fn test_covering_rows() {
        let mut table = ResultSet::new(["target", SUPPORT_COLUMN]);
        table.push_values(vec![json!("a"), json!("[84.0..86.0GHz,31250kHz] U [96.0..98.0GHz,31250kHz]")]);
        table.push_values(vec![json!("b"), json!("[213.0..215.0GHz,31250kHz]")]);
        table.push_values(vec![json!("c"), Value::Null]);

        let covered = covering_rows(table, 97.0);
        assert_eq!(covered.len(), 1);
        assert_eq!(covered.rows[0]["target"], json!("a"));
    }

    #[tokio::test]
    async fn test_line_coverage_counts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tap/sync"))
            .and(body_string_contains("data_rights"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "target_name\ts_ra\ts_dec\tfrequency_support\n\
                 Orion KL\t83.82\t-5.39\t[229.0..231.5GHz,31250kHz]\n\
                 Orion KL\t83.82\t-5.39\t[100.0..102.0GHz,31250kHz]\n",
            ))
            .mount(&server)
            .await;

        let alminer = backend_for(&server).await;
        let intent = Intent::LineCoverage(LineCoverageSearch {
            target_name: "Orion KL".to_string(),
            line_frequency_ghz: 230.538,
            redshift: 0.0,
        });
        let table = alminer.execute(&intent).await.unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.metadata["total_observations"], json!(2));
        assert_eq!(table.metadata["covering_line"], json!(1));
        assert_eq!(table.metadata["observed_frequency_ghz"], json!(230.538));
        assert_eq!(table.summary.as_deref(), Some("1 of 2 observations cover the line"));
    }

    #[tokio::test]
    async fn test_unsupported_intent() {
        let server = MockServer::start().await;
        let alminer = backend_for(&server).await;
        let intent = Intent::RawQuery(RawQuery {
            sql_query: "SELECT 1".to_string(),
            max_rows: 1,
        });
        let err = alminer.execute(&intent).await.unwrap_err();
        assert!(matches!(err, BackendError::QueryFailed(_)));
        assert!(!alminer.supports(IntentKind::RawQuery));
        assert!(alminer.supports(IntentKind::LineCoverage));
    }
}
