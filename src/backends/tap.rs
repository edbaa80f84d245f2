//! Raw ADQL backend for the ALMA TAP service
//!
//! Every archive intent is translated into an ADQL string against
//! `ivoa.obscore`. This is the most widely usable backend and the last
//! resort for intents that a richer backend serves first.

use super::adql::{self, Select};
use super::obscore::{self, ArchiveOptions};
use super::spectral;
use super::traits::*;
use crate::config::BackendConfig;
use crate::intents::*;
use crate::network::{HttpClient, TapService};
use crate::results::ResultSet;
use async_trait::async_trait;
use serde_json::json;

const INTENTS: &[IntentKind] = &[
    IntentKind::ByTarget,
    IntentKind::ByPosition,
    IntentKind::ByFrequency,
    IntentKind::ByResolution,
    IntentKind::ByProposal,
    IntentKind::LineCoverage,
    IntentKind::ByBibliography,
    IntentKind::ByMemberOus,
    IntentKind::ByDataType,
    IntentKind::ByScienceKeyword,
    IntentKind::ByAbstract,
    IntentKind::BySensitivity,
    IntentKind::RawQuery,
    IntentKind::BySourceName,
];

/// ALMA TAP backend
pub struct Tap {
    client: HttpClient,
    service: Option<TapService>,
    resolver: SharedResolver,
    options: ArchiveOptions,
}

impl Tap {
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
            .ok_or(BackendError::Unavailable(BackendId::Tap))
    }

    fn rows(&self) -> u32 {
        self.options.max_rows
    }

    async fn search_target(&self, p: &TargetSearch) -> Result<ResultSet, BackendError> {
        let coords = resolve_target(&self.resolver, &p.target_name).await?;
        let query = cone_query(coords.ra_deg, coords.dec_deg, p.radius_arcmin, p.public_only, self.rows());
        let table = obscore::run(self.service()?, &query).await?;

        let summary = format!("Found {} ALMA observations for {}", table.len(), p.target_name);
        Ok(table
            .with_summary(summary)
            .with_meta("target_resolved_to", json!(coords)))
    }

    async fn search_position(&self, p: &PositionSearch) -> Result<ResultSet, BackendError> {
        let query = cone_query(p.ra_degrees, p.dec_degrees, p.radius_arcmin, p.public_only, self.rows());
        let table = obscore::run(self.service()?, &query).await?;

        let summary = format!(
            "Found {} ALMA observations near RA={:.4}, Dec={:.4}",
            table.len(),
            p.ra_degrees,
            p.dec_degrees
        );
        Ok(table.with_summary(summary))
    }

    async fn line_coverage(&self, p: &LineCoverageSearch) -> Result<ResultSet, BackendError> {
        let coords = resolve_target(&self.resolver, &p.target_name).await?;
        let observed = p.observed_frequency_ghz();
        let query = line_coverage_query(
            coords.ra_deg,
            coords.dec_deg,
            self.options.line_coverage_radius_deg,
            observed,
            self.rows(),
        );
        let table = obscore::run(self.service()?, &query).await?;

        let summary = format!(
            "{} observations of {} cover {} GHz at z={}",
            table.len(),
            p.target_name,
            p.line_frequency_ghz,
            p.redshift
        );
        Ok(table
            .with_summary(summary)
            .with_meta("target_resolved_to", json!(coords))
            .with_meta("line_frequency_ghz", p.line_frequency_ghz)
            .with_meta("redshift", p.redshift)
            .with_meta("observed_frequency_ghz", observed))
    }

    async fn raw_query(&self, p: &RawQuery) -> Result<ResultSet, BackendError> {
        let adql = adql::ensure_top(&p.sql_query, p.max_rows);
        let mut table = obscore::run_adql(self.service()?, &adql).await?;
        table.rows.truncate(p.max_rows as usize);

        let summary = format!("Query returned {} rows", table.len());
        Ok(table.with_summary(summary))
    }

    async fn simple(&self, query: Select, summary: impl FnOnce(&ResultSet) -> String) -> Result<ResultSet, BackendError> {
        let table = obscore::run(self.service()?, &query).await?;
        let text = summary(&table);
        Ok(table.with_summary(text))
    }
}

#[async_trait]
impl Backend for Tap {
    fn id(&self) -> BackendId {
        BackendId::Tap
    }

    fn about(&self) -> BackendAbout {
        BackendAbout::new("ADQL queries against the ALMA ObsCore table")
            .website("https://almascience.org/tap")
            .standard_protocol(true)
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
        let rows = self.rows();

        match intent {
            Intent::ByTarget(p) => self.search_target(p).await,
            Intent::ByPosition(p) => self.search_position(p).await,
            Intent::LineCoverage(p) => self.line_coverage(p).await,
            Intent::RawQuery(p) => self.raw_query(p).await,
            Intent::ByFrequency(p) => {
                self.simple(frequency_query(p, rows), |t| {
                    format!(
                        "Found {} observations in {}-{} GHz range",
                        t.len(),
                        p.min_freq_ghz,
                        p.max_freq_ghz
                    )
                })
                .await
            }
            Intent::ByResolution(p) => {
                self.simple(resolution_query(p, rows), |t| {
                    format!(
                        "Found {} observations with resolution {}-{} arcsec",
                        t.len(),
                        p.min_resolution_arcsec,
                        p.max_resolution_arcsec
                    )
                })
                .await
            }
            Intent::ByProposal(p) => {
                self.simple(proposal_query(p, rows), |t| {
                    format!("Found {} observations matching criteria", t.len())
                })
                .await
            }
            Intent::ByBibliography(p) => {
                self.simple(bibliography_query(p, rows), |t| {
                    format!("Found {} observations with matching publications", t.len())
                })
                .await
            }
            Intent::ByMemberOus(p) => {
                let uid = p.normalized_uid();
                let table = self
                    .simple(member_ous_query(&uid, rows), |t| {
                        format!("Found {} data products for Member OUS {}", t.len(), uid)
                    })
                    .await?;
                Ok(table.with_meta("member_ous_id", uid.clone()))
            }
            Intent::ByDataType(p) => {
                self.simple(data_type_query(p, rows), |t| {
                    format!("Found {} {} observations", t.len(), p.data_type)
                })
                .await
            }
            Intent::ByScienceKeyword(p) => {
                let table = self
                    .simple(science_keyword_query(p, rows), |t| {
                        format!(
                            "Found {} observations with science keyword '{}'",
                            t.len(),
                            p.science_keyword
                        )
                    })
                    .await?;
                let targets = table.distinct_strings(super::columns::TARGET, 10);
                Ok(table.with_meta("unique_targets", targets))
            }
            Intent::ByAbstract(p) => {
                let table = self
                    .simple(abstract_query(p, rows), |t| {
                        format!(
                            "Found {} observations from proposals mentioning '{}'",
                            t.len(),
                            p.search_terms
                        )
                    })
                    .await?;
                let proposals = table.distinct_strings(super::columns::PROPOSAL_ID, 10);
                Ok(table.with_meta("unique_proposals", proposals))
            }
            Intent::BySensitivity(p) => {
                self.simple(sensitivity_query(p, rows), |t| {
                    format!(
                        "Found {} observations with {} sensitivity <= {} mJy/beam",
                        t.len(),
                        p.sensitivity_type.as_str(),
                        p.max_sensitivity_mjy
                    )
                })
                .await
            }
            Intent::BySourceName(p) => {
                let table = self
                    .simple(source_name_query(p, rows), |t| {
                        format!(
                            "Found {} observations matching source name '{}'",
                            t.len(),
                            p.source_name
                        )
                    })
                    .await?;
                let targets = table.distinct_strings(super::columns::TARGET, 10);
                Ok(table.with_meta("unique_targets", targets))
            }
            other => Err(unsupported(BackendId::Tap, other)),
        }
    }
}

pub(crate) fn cone_query(ra: f64, dec: f64, radius_arcmin: f64, public_only: bool, rows: u32) -> Select {
    obscore::observations(rows)
        .filter(adql::cone(ra, dec, obscore::arcmin_to_deg(radius_arcmin)))
        .filter_opt(obscore::public_filter(public_only))
}

pub(crate) fn line_coverage_query(ra: f64, dec: f64, radius_deg: f64, observed_ghz: f64, rows: u32) -> Select {
    let lambda = spectral::wavelength_m(observed_ghz);
    obscore::observations(rows)
        .column("em_min")
        .column("em_max")
        .filter(adql::cone(ra, dec, radius_deg))
        .filter(format!("em_min <= {}", lambda))
        .filter(format!("em_max >= {}", lambda))
}

pub(crate) fn frequency_query(p: &FrequencySearch, rows: u32) -> Select {
    obscore::observations(rows)
        .filter(format!("frequency >= {}", p.min_freq_ghz))
        .filter(format!("frequency <= {}", p.max_freq_ghz))
        .filter_opt(obscore::target_filter(&p.target_name))
        .order_by("frequency")
}

pub(crate) fn resolution_query(p: &ResolutionSearch, rows: u32) -> Select {
    obscore::observations(rows)
        .filter(format!("s_resolution <= {}", p.max_resolution_arcsec))
        .filter(format!("s_resolution >= {}", p.min_resolution_arcsec))
        .filter_opt(obscore::target_filter(&p.target_name))
        .order_by("s_resolution")
}

pub(crate) fn proposal_query(p: &ProposalSearch, rows: u32) -> Select {
    Select::from(obscore::TABLE)
        .top(rows)
        .columns(["target_name", "s_ra", "s_dec", "band_list", "proposal_id", "obs_creator_name", "scientific_category"])
        .filter_opt(p.proposal_id.as_deref().map(|id| adql::contains("proposal_id", id)))
        .filter_opt(p.pi_name.as_deref().map(|pi| adql::contains_ci("obs_creator_name", pi)))
        .filter_opt(
            p.science_category
                .as_deref()
                .map(|c| adql::contains_ci("scientific_category", c)),
        )
}

pub(crate) fn bibliography_query(p: &BibliographySearch, rows: u32) -> Select {
    Select::from(obscore::TABLE)
        .top(rows)
        .columns([
            "target_name",
            "s_ra",
            "s_dec",
            "band_list",
            "proposal_id",
            "bib_reference",
            "first_author",
            "publication_year",
            "pub_title",
        ])
        .filter_opt(p.bibcode.as_deref().map(|b| adql::contains("bib_reference", b)))
        .filter_opt(p.journal_name.as_deref().map(|j| adql::contains("bib_reference", j)))
        .filter_opt(p.first_author.as_deref().map(|a| adql::contains_ci("first_author", a)))
        .filter_opt(p.publication_year.map(|y| format!("publication_year = {}", y)))
}

pub(crate) fn member_ous_query(uid: &str, rows: u32) -> Select {
    obscore::observations(rows)
        .columns(["dataproduct_type", "member_ous_uid", "access_url"])
        .filter(format!("member_ous_uid = {}", adql::quote(uid)))
}

pub(crate) fn data_type_query(p: &DataTypeSearch, rows: u32) -> Select {
    obscore::observations(rows)
        .column("science_keyword")
        .filter(format!("dataproduct_type = {}", adql::quote(p.data_type.as_str())))
        .filter("science_observation = 'T'")
        .filter_opt(obscore::target_filter(&p.target_name))
        .filter_opt(
            p.science_keyword
                .as_deref()
                .map(|k| adql::contains_ci("science_keyword", k)),
        )
        .filter_opt(obscore::band_filter(p.band))
}

pub(crate) fn science_keyword_query(p: &ScienceKeywordSearch, rows: u32) -> Select {
    obscore::observations(rows)
        .columns(["science_keyword", "dataproduct_type"])
        .filter(adql::contains_ci("science_keyword", &p.science_keyword))
        .filter_opt(p.science_observation_only.then(|| "science_observation = 'T'".to_string()))
        .filter_opt(
            p.data_type
                .map(|d| format!("dataproduct_type = {}", adql::quote(d.as_str()))),
        )
        .filter_opt(obscore::band_filter(p.band))
}

pub(crate) fn abstract_query(p: &AbstractSearch, rows: u32) -> Select {
    let condition = if p.search_pub_abstract {
        format!(
            "({} OR {})",
            adql::contains_ci("proposal_abstract", &p.search_terms),
            adql::contains_ci("pub_abstract", &p.search_terms)
        )
    } else {
        adql::contains_ci("proposal_abstract", &p.search_terms)
    };

    Select::from(obscore::TABLE)
        .distinct()
        .top(rows)
        .columns([
            "target_name",
            "s_ra",
            "s_dec",
            "band_list",
            "proposal_id",
            "obs_creator_name",
            "science_keyword",
            "t_exptime",
        ])
        .filter(condition)
        .filter("science_observation = 'T'")
}

pub(crate) fn sensitivity_query(p: &SensitivitySearch, rows: u32) -> Select {
    let column = match p.sensitivity_type {
        SensitivityType::Continuum => "cont_sensitivity_bandwidth",
        SensitivityType::Line => "sensitivity_10kms",
    };

    Select::from(obscore::TABLE)
        .top(rows)
        .columns(["target_name", "s_ra", "s_dec", "band_list", "proposal_id"])
        .column(format!("{} AS sensitivity", column))
        .columns(["s_resolution", "frequency"])
        .filter(format!("{} <= {}", column, p.max_sensitivity_mjy))
        .filter(format!("{} > 0", column))
        .filter("science_observation = 'T'")
        .filter_opt(obscore::target_filter(&p.target_name))
        .filter_opt(obscore::band_filter(p.band))
        .order_by(column)
}

pub(crate) fn source_name_query(p: &SourceNameSearch, rows: u32) -> Select {
    let condition = if p.exact_match {
        format!("target_name = {}", adql::quote(p.source_name.trim()))
    } else {
        adql::contains_ci("target_name", &p.source_name)
    };
    obscore::observations(rows)
        .column("dataproduct_type")
        .filter(condition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::Row;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedResolver;

    #[async_trait]
    impl TargetResolver for FixedResolver {
        async fn resolve(&self, name: &str) -> Result<Coordinates, BackendError> {
            Ok(Coordinates {
                main_id: name.to_string(),
                ra_deg: 187.7059,
                dec_deg: 12.3911,
            })
        }
    }

    async fn backend_for(server: &MockServer, resolver: SharedResolver) -> Tap {
        let mut tap = Tap::new(HttpClient::new().unwrap(), resolver, ArchiveOptions::default());
        tap.init(&BackendConfig {
            url: Some(format!("{}/tap", server.uri())),
            ..BackendConfig::named("tap")
        })
        .unwrap();
        tap
    }

    #[test]
    fn test_resolution_threshold_forwarded_verbatim() {
        let p = ResolutionSearch {
            max_resolution_arcsec: 0.5,
            min_resolution_arcsec: 0.0,
            target_name: None,
        };
        let sql = resolution_query(&p, 100).to_adql();
        assert!(sql.contains("s_resolution <= 0.5 "));
        assert!(sql.contains("s_resolution >= 0 "));
        assert!(sql.ends_with("ORDER BY s_resolution"));
    }

    #[test]
    fn test_frequency_query() {
        let p = FrequencySearch {
            min_freq_ghz: 84.0,
            max_freq_ghz: 116.5,
            target_name: Some("M87".to_string()),
        };
        let sql = frequency_query(&p, 100).to_adql();
        assert!(sql.starts_with("SELECT TOP 100 target_name"));
        assert!(sql.contains("frequency >= 84 AND frequency <= 116.5"));
        assert!(sql.contains("LOWER(target_name) LIKE '%m87%'"));
    }

    #[test]
    fn test_sensitivity_column_choice() {
        let p = SensitivitySearch {
            max_sensitivity_mjy: 0.05,
            sensitivity_type: SensitivityType::Line,
            target_name: None,
            band: Some(7),
        };
        let sql = sensitivity_query(&p, 10).to_adql();
        assert!(sql.contains("sensitivity_10kms AS sensitivity"));
        assert!(sql.contains("sensitivity_10kms <= 0.05"));
        assert!(sql.contains("'% 7 %'"));
    }

    #[test]
    fn test_source_name_exact_is_quoted() {
        let p = SourceNameSearch {
            source_name: "Barnard's Star".to_string(),
            exact_match: true,
        };
        let sql = source_name_query(&p, 10).to_adql();
        assert!(sql.contains("target_name = 'Barnard''s Star'"));
    }

    #[test]
    fn test_abstract_query_pub_abstract() {
        let p = AbstractSearch {
            search_terms: "protoplanetary".to_string(),
            search_pub_abstract: true,
        };
        let sql = abstract_query(&p, 100).to_adql();
        assert!(sql.starts_with("SELECT DISTINCT TOP 100"));
        assert!(sql.contains("OR LOWER(pub_abstract) LIKE '%protoplanetary%'"));
    }

    #[test]
    fn test_line_coverage_wavelength_predicate() {
        let sql = line_coverage_query(10.0, -5.0, 0.016, 299.792458, 100).to_adql();
        assert!(sql.contains("em_min <= 0.001"));
        assert!(sql.contains("em_max >= 0.001"));
    }

    #[tokio::test]
    async fn test_uninitialized_backend_is_unavailable() {
        let tap = Tap::new(HttpClient::new().unwrap(), None, ArchiveOptions::default());
        assert!(!tap.is_ready());
        let err = tap.execute(&Intent::InfoLookup).await.unwrap_err();
        assert_eq!(err, BackendError::Unavailable(BackendId::Tap));
    }

    #[tokio::test]
    async fn test_frequency_search_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tap/sync"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "target_name\ts_ra\ts_dec\tband_list\tproposal_id\tfrequency\tbandwidth\tt_exptime\ts_resolution\n\
                 M87\t187.7\t12.39\t3\t2019.1.00001.S\t100.5\t1875000000\t1200\t0.4\n",
            ))
            .mount(&server)
            .await;

        let tap = backend_for(&server, None).await;
        let intent = Intent::ByFrequency(FrequencySearch {
            min_freq_ghz: 84.0,
            max_freq_ghz: 116.0,
            target_name: None,
        });
        let table = tap.execute(&intent).await.unwrap();

        assert_eq!(table.len(), 1);
        let row: &Row = &table.rows[0];
        assert_eq!(row["target"], json!("M87"));
        assert_eq!(row["frequency_ghz"], json!(100.5));
        assert_eq!(row["bandwidth_ghz"], json!(1.875));
        assert_eq!(row["resolution_arcsec"], json!(0.4));
        assert!(table.summary.unwrap().contains("84-116 GHz"));
    }

    #[tokio::test]
    async fn test_target_search_needs_resolver() {
        let server = MockServer::start().await;
        let tap = backend_for(&server, None).await;
        let intent = Intent::ByTarget(TargetSearch {
            target_name: "M87".to_string(),
            radius_arcmin: 1.0,
            public_only: true,
        });

        let err = tap.execute(&intent).await.unwrap_err();
        assert_eq!(err.to_string(), "target name resolution unavailable");
    }

    #[tokio::test]
    async fn test_target_search_with_resolver() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tap/sync"))
            .respond_with(ResponseTemplate::new(200).set_body_string("target_name\ts_ra\ts_dec\n"))
            .mount(&server)
            .await;

        let tap = backend_for(&server, Some(Arc::new(FixedResolver))).await;
        let intent = Intent::ByTarget(TargetSearch {
            target_name: "M87".to_string(),
            radius_arcmin: 1.0,
            public_only: true,
        });
        let table = tap.execute(&intent).await.unwrap();

        assert!(table.is_empty());
        assert_eq!(table.columns, vec!["target", "ra", "dec"]);
        assert_eq!(table.metadata["target_resolved_to"]["ra_deg"], json!(187.7059));
    }

    #[tokio::test]
    async fn test_service_error_is_query_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tap/sync"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let tap = backend_for(&server, None).await;
        let intent = Intent::RawQuery(RawQuery {
            sql_query: "SELECT target_name FROM ivoa.obscore".to_string(),
            max_rows: 10,
        });
        let err = tap.execute(&intent).await.unwrap_err();
        assert_eq!(err, BackendError::QueryFailed("HTTP 500: upstream down".to_string()));
    }
}
