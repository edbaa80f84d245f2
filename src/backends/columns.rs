//! Canonical column names shared by every backend
//!
//! Adapters rename their native columns to these so that the same quantity
//! has the same name whichever backend produced it.

use crate::results::ResultSet;
use serde_json::Value;

pub const TARGET: &str = "target";
pub const RA: &str = "ra";
pub const DEC: &str = "dec";
pub const BAND: &str = "band";
pub const PROPOSAL_ID: &str = "proposal_id";
pub const FREQUENCY_GHZ: &str = "frequency_ghz";
pub const BANDWIDTH_GHZ: &str = "bandwidth_ghz";
pub const RESOLUTION_ARCSEC: &str = "resolution_arcsec";
pub const INTEGRATION_TIME_S: &str = "integration_time_s";
pub const PI: &str = "pi";
pub const DATA_TYPE: &str = "data_type";
pub const SCIENCE_KEYWORD: &str = "science_keyword";
pub const SCIENCE_CATEGORY: &str = "science_category";
pub const SENSITIVITY_MJY: &str = "sensitivity_mjy";
pub const SENSITIVITY_BANDWIDTH_MJY: &str = "sensitivity_bandwidth_mjy";
pub const SENSITIVITY_10KMS_MJY: &str = "sensitivity_10kms_mjy";
pub const MEMBER_OUS_ID: &str = "member_ous_id";
pub const ACCESS_URL: &str = "access_url";
pub const BIBCODE: &str = "bibcode";
pub const FIRST_AUTHOR: &str = "first_author";
pub const PUB_YEAR: &str = "pub_year";
pub const PUB_TITLE: &str = "pub_title";
pub const OBJECT_TYPE: &str = "object_type";

/// ALMA ObsCore column -> canonical column
pub const OBSCORE: &[(&str, &str)] = &[
    ("target_name", TARGET),
    ("s_ra", RA),
    ("s_dec", DEC),
    ("band_list", BAND),
    ("project_code", PROPOSAL_ID),
    ("frequency", FREQUENCY_GHZ),
    ("bandwidth", BANDWIDTH_GHZ),
    ("s_resolution", RESOLUTION_ARCSEC),
    ("t_exptime", INTEGRATION_TIME_S),
    ("obs_creator_name", PI),
    ("pi_name", PI),
    ("dataproduct_type", DATA_TYPE),
    ("scientific_category", SCIENCE_CATEGORY),
    ("sensitivity", SENSITIVITY_MJY),
    ("cont_sensitivity_bandwidth", SENSITIVITY_BANDWIDTH_MJY),
    ("sensitivity_10kms", SENSITIVITY_10KMS_MJY),
    ("member_ous_uid", MEMBER_OUS_ID),
    ("bib_reference", BIBCODE),
    ("publication_year", PUB_YEAR),
];

/// SIMBAD `basic` column -> canonical column
pub const SIMBAD: &[(&str, &str)] = &[
    ("main_id", TARGET),
    ("otype", OBJECT_TYPE),
];

/// Rename ObsCore columns and convert bandwidth from Hz to GHz
pub fn reconcile_obscore(table: &mut ResultSet) {
    table.rename_columns(OBSCORE);

    if table.columns.iter().any(|c| c == BANDWIDTH_GHZ) {
        for row in &mut table.rows {
            if let Some(hz) = row.get(BANDWIDTH_GHZ).and_then(Value::as_f64) {
                row.insert(BANDWIDTH_GHZ.to_string(), Value::from(hz / 1e9));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reconcile_obscore() {
        let mut table = ResultSet::new(["target_name", "bandwidth", "obs_creator_name", "obs_id"]);
        table.push_values(vec![json!("M87"), json!(1_875_000_000.0), json!("Doe, J."), json!("x")]);
        reconcile_obscore(&mut table);

        assert_eq!(table.columns, vec!["target", "bandwidth_ghz", "pi", "obs_id"]);
        assert_eq!(table.rows[0]["bandwidth_ghz"], json!(1.875));
        assert_eq!(table.rows[0]["pi"], json!("Doe, J."));
    }

    #[test]
    fn test_both_sensitivities_survive() {
        let mut table = ResultSet::new(["obs_id", "cont_sensitivity_bandwidth", "sensitivity_10kms"]);
        table.push_values(vec![json!("uid://A001"), json!(0.02), json!(0.9)]);
        reconcile_obscore(&mut table);

        assert_eq!(
            table.columns,
            vec!["obs_id", "sensitivity_bandwidth_mjy", "sensitivity_10kms_mjy"]
        );
        assert_eq!(table.rows[0]["sensitivity_bandwidth_mjy"], json!(0.02));
        assert_eq!(table.rows[0]["sensitivity_10kms_mjy"], json!(0.9));
    }
}
