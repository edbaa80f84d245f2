//! Typed parameter records, one per intent

use serde::{Deserialize, Serialize};
use std::fmt;

fn default_radius() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_max_rows() -> u32 {
    100
}

/// Search around a named object after resolving it to coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSearch {
    pub target_name: String,
    #[serde(default = "default_radius")]
    pub radius_arcmin: f64,
    #[serde(default = "default_true")]
    pub public_only: bool,
}

/// Cone search at explicit ICRS coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PositionSearch {
    pub ra_degrees: f64,
    pub dec_degrees: f64,
    #[serde(default = "default_radius")]
    pub radius_arcmin: f64,
    #[serde(default = "default_true")]
    pub public_only: bool,
}

/// Observations whose central frequency lies in a range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrequencySearch {
    pub min_freq_ghz: f64,
    pub max_freq_ghz: f64,
    #[serde(default)]
    pub target_name: Option<String>,
}

/// Observations within an angular resolution band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolutionSearch {
    pub max_resolution_arcsec: f64,
    #[serde(default)]
    pub min_resolution_arcsec: f64,
    #[serde(default)]
    pub target_name: Option<String>,
}

/// Proposal metadata lookup; at least one field must be given
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProposalSearch {
    #[serde(default)]
    pub proposal_id: Option<String>,
    #[serde(default)]
    pub pi_name: Option<String>,
    #[serde(default)]
    pub science_category: Option<String>,
}

/// Does any observation of a target cover a (redshifted) spectral line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineCoverageSearch {
    pub target_name: String,
    pub line_frequency_ghz: f64,
    #[serde(default)]
    pub redshift: f64,
}

impl LineCoverageSearch {
    /// Observed (sky) frequency of the line
    pub fn observed_frequency_ghz(&self) -> f64 {
        self.line_frequency_ghz / (1.0 + self.redshift)
    }
}

/// Observations linked to publications; at least one field must be given
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BibliographySearch {
    #[serde(default)]
    pub bibcode: Option<String>,
    #[serde(default)]
    pub journal_name: Option<String>,
    #[serde(default)]
    pub first_author: Option<String>,
    #[serde(default)]
    pub publication_year: Option<i32>,
}

/// Lookup by Member ObsUnitSet identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberOusSearch {
    pub member_ous_id: String,
}

impl MemberOusSearch {
    /// Identifier in `uid://A001/X123/X456` form
    ///
    /// Accepts the filesystem-safe `uid___A001_X123_X456` spelling as well.
    pub fn normalized_uid(&self) -> String {
        self.member_ous_id
            .trim()
            .replace("___", "://")
            .replace('_', "/")
    }
}

/// Data product type of an ALMA dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DataProductType {
    /// Spectral line cube
    Cube,
    /// Continuum image
    Image,
}

impl DataProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cube => "cube",
            Self::Image => "image",
        }
    }
}

impl TryFrom<String> for DataProductType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "cube" => Ok(Self::Cube),
            "image" => Ok(Self::Image),
            other => Err(format!("data_type must be 'cube' or 'image', got '{}'", other)),
        }
    }
}

impl From<DataProductType> for String {
    fn from(value: DataProductType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for DataProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter on data product type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataTypeSearch {
    pub data_type: DataProductType,
    #[serde(default)]
    pub target_name: Option<String>,
    #[serde(default)]
    pub science_keyword: Option<String>,
    #[serde(default)]
    pub band: Option<u8>,
}

/// Filter on ALMA science keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScienceKeywordSearch {
    pub science_keyword: String,
    #[serde(default)]
    pub data_type: Option<DataProductType>,
    #[serde(default)]
    pub band: Option<u8>,
    #[serde(default = "default_true")]
    pub science_observation_only: bool,
}

/// Free-text match in proposal (and optionally publication) abstracts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AbstractSearch {
    pub search_terms: String,
    #[serde(default)]
    pub search_pub_abstract: bool,
}

/// Which sensitivity figure to filter on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SensitivityType {
    /// Continuum sensitivity over the full bandwidth
    #[default]
    Continuum,
    /// Line sensitivity at 10 km/s
    Line,
}

impl SensitivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continuum => "continuum",
            Self::Line => "line",
        }
    }
}

impl TryFrom<String> for SensitivityType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "continuum" => Ok(Self::Continuum),
            "line" => Ok(Self::Line),
            other => Err(format!(
                "sensitivity_type must be 'continuum' or 'line', got '{}'",
                other
            )),
        }
    }
}

impl From<SensitivityType> for String {
    fn from(value: SensitivityType) -> Self {
        value.as_str().to_string()
    }
}

/// Observations at or below a sensitivity limit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensitivitySearch {
    pub max_sensitivity_mjy: f64,
    #[serde(default)]
    pub sensitivity_type: SensitivityType,
    #[serde(default)]
    pub target_name: Option<String>,
    #[serde(default)]
    pub band: Option<u8>,
}

/// Caller-written ADQL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawQuery {
    pub sql_query: String,
    #[serde(default = "default_max_rows")]
    pub max_rows: u32,
}

/// Match on the target name as written by the PI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceNameSearch {
    pub source_name: String,
    #[serde(default)]
    pub exact_match: bool,
}

/// Several targets at once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MultiSourceSearch {
    pub source_names: Vec<String>,
    #[serde(default = "default_radius")]
    pub radius_arcmin: f64,
}

impl MultiSourceSearch {
    /// Trimmed source names with duplicates removed, first occurrence kept
    pub fn unique_sources(&self) -> Vec<String> {
        let mut unique: Vec<String> = Vec::with_capacity(self.source_names.len());
        for name in &self.source_names {
            let name = name.trim();
            if !unique.iter().any(|n| n == name) {
                unique.push(name.to_string());
            }
        }
        unique
    }
}

/// Resolve a name to coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolveTarget {
    pub target_name: String,
}
