//! Parameter domain checks applied before any backend is contacted

use super::*;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

static MEMBER_OUS_UID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^uid://[A-Za-z0-9]+/[A-Za-z0-9]+/[A-Za-z0-9]+$").expect("valid regex")
});

/// A parameter failed its schema or domain check
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{field}: {reason}")]
pub struct ParamError {
    pub field: String,
    pub reason: String,
}

impl ParamError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Map a deserialization failure onto the offending field where possible
    pub(crate) fn from_serde(err: serde_json::Error) -> Self {
        let message = err.to_string();
        let field = message
            .split('`')
            .nth(1)
            .filter(|_| message.contains("field"))
            .unwrap_or("arguments")
            .to_string();
        Self::new(field, message)
    }
}

/// Limits that depend on configuration
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Largest accepted batch
    pub batch_max_sources: usize,
    /// Largest row limit accepted for raw queries
    pub raw_query_max_rows: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            batch_max_sources: 20,
            raw_query_max_rows: 1000,
        }
    }
}

type Check = Result<(), ParamError>;

fn non_blank(field: &str, value: &str) -> Check {
    if value.trim().is_empty() {
        return Err(ParamError::new(field, "must not be empty"));
    }
    Ok(())
}

fn optional_non_blank(field: &str, value: &Option<String>) -> Check {
    match value {
        Some(v) => non_blank(field, v),
        None => Ok(()),
    }
}

fn finite(field: &str, value: f64) -> Check {
    if !value.is_finite() {
        return Err(ParamError::new(field, "must be a finite number"));
    }
    Ok(())
}

fn positive(field: &str, value: f64) -> Check {
    finite(field, value)?;
    if value <= 0.0 {
        return Err(ParamError::new(field, format!("must be > 0, got {}", value)));
    }
    Ok(())
}

fn band(value: Option<u8>) -> Check {
    match value {
        Some(b) if !(1..=10).contains(&b) => Err(ParamError::new(
            "band",
            format!("ALMA bands are numbered 1-10, got {}", b),
        )),
        _ => Ok(()),
    }
}

fn is_present(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

impl Intent {
    /// Check required fields and value domains
    pub fn validate(&self, limits: &Limits) -> Result<(), ParamError> {
        match self {
            Intent::ByTarget(p) => {
                non_blank("target_name", &p.target_name)?;
                positive("radius_arcmin", p.radius_arcmin)
            }
            Intent::ByPosition(p) => {
                finite("ra_degrees", p.ra_degrees)?;
                if !(0.0..360.0).contains(&p.ra_degrees) {
                    return Err(ParamError::new("ra_degrees", "must be in [0, 360)"));
                }
                finite("dec_degrees", p.dec_degrees)?;
                if !(-90.0..=90.0).contains(&p.dec_degrees) {
                    return Err(ParamError::new("dec_degrees", "must be in [-90, 90]"));
                }
                positive("radius_arcmin", p.radius_arcmin)
            }
            Intent::ByFrequency(p) => {
                positive("min_freq_ghz", p.min_freq_ghz)?;
                positive("max_freq_ghz", p.max_freq_ghz)?;
                if p.min_freq_ghz >= p.max_freq_ghz {
                    return Err(ParamError::new(
                        "min_freq_ghz",
                        format!(
                            "lower bound {} must be below upper bound {}",
                            p.min_freq_ghz, p.max_freq_ghz
                        ),
                    ));
                }
                optional_non_blank("target_name", &p.target_name)
            }
            Intent::ByResolution(p) => {
                positive("max_resolution_arcsec", p.max_resolution_arcsec)?;
                finite("min_resolution_arcsec", p.min_resolution_arcsec)?;
                if p.min_resolution_arcsec < 0.0 {
                    return Err(ParamError::new("min_resolution_arcsec", "must be >= 0"));
                }
                if p.min_resolution_arcsec >= p.max_resolution_arcsec {
                    return Err(ParamError::new(
                        "min_resolution_arcsec",
                        "must be below max_resolution_arcsec",
                    ));
                }
                optional_non_blank("target_name", &p.target_name)
            }
            Intent::ByProposal(p) => {
                if !(is_present(&p.proposal_id)
                    || is_present(&p.pi_name)
                    || is_present(&p.science_category))
                {
                    return Err(ParamError::new(
                        "arguments",
                        "provide at least one of proposal_id, pi_name, science_category",
                    ));
                }
                Ok(())
            }
            Intent::LineCoverage(p) => {
                non_blank("target_name", &p.target_name)?;
                positive("line_frequency_ghz", p.line_frequency_ghz)?;
                finite("redshift", p.redshift)?;
                if p.redshift <= -1.0 {
                    return Err(ParamError::new("redshift", "must be > -1"));
                }
                Ok(())
            }
            Intent::ByBibliography(p) => {
                if !(is_present(&p.bibcode)
                    || is_present(&p.journal_name)
                    || is_present(&p.first_author)
                    || p.publication_year.is_some())
                {
                    return Err(ParamError::new(
                        "arguments",
                        "provide at least one of bibcode, journal_name, first_author, publication_year",
                    ));
                }
                Ok(())
            }
            Intent::ByMemberOus(p) => {
                non_blank("member_ous_id", &p.member_ous_id)?;
                if !MEMBER_OUS_UID.is_match(&p.normalized_uid()) {
                    return Err(ParamError::new(
                        "member_ous_id",
                        "expected uid://A001/X123/X456 or uid___A001_X123_X456",
                    ));
                }
                Ok(())
            }
            Intent::ByDataType(p) => {
                optional_non_blank("target_name", &p.target_name)?;
                optional_non_blank("science_keyword", &p.science_keyword)?;
                band(p.band)
            }
            Intent::ByScienceKeyword(p) => {
                non_blank("science_keyword", &p.science_keyword)?;
                band(p.band)
            }
            Intent::ByAbstract(p) => non_blank("search_terms", &p.search_terms),
            Intent::BySensitivity(p) => {
                positive("max_sensitivity_mjy", p.max_sensitivity_mjy)?;
                optional_non_blank("target_name", &p.target_name)?;
                band(p.band)
            }
            Intent::RawQuery(p) => {
                non_blank("sql_query", &p.sql_query)?;
                if p.max_rows == 0 || p.max_rows > limits.raw_query_max_rows {
                    return Err(ParamError::new(
                        "max_rows",
                        format!("must be between 1 and {}", limits.raw_query_max_rows),
                    ));
                }
                Ok(())
            }
            Intent::BySourceName(p) => non_blank("source_name", &p.source_name),
            Intent::MultiSource(p) => {
                positive("radius_arcmin", p.radius_arcmin)?;
                if p.source_names.is_empty() {
                    return Err(ParamError::new("source_names", "must list at least one source"));
                }
                if p.source_names.iter().any(|n| n.trim().is_empty()) {
                    return Err(ParamError::new("source_names", "names must not be empty"));
                }
                let unique = p.unique_sources().len();
                if unique > limits.batch_max_sources {
                    return Err(ParamError::new(
                        "source_names",
                        format!(
                            "{} sources requested, at most {} per batch",
                            unique, limits.batch_max_sources
                        ),
                    ));
                }
                Ok(())
            }
            Intent::InfoLookup => Ok(()),
            Intent::ResolveTarget(p) => non_blank("target_name", &p.target_name),
        }
    }
}
