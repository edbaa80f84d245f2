//! Tool catalog advertised to the calling agent

use super::IntentKind;
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// One documented tool parameter
#[derive(Debug, Clone, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    /// JSON schema type
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub description: &'static str,
}

impl ParamSpec {
    fn required(name: &'static str, kind: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: None,
            description,
        }
    }

    fn optional(name: &'static str, kind: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: None,
            description,
        }
    }

    fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Description of one tool (intent)
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub intent: IntentKind,
    pub description: &'static str,
    pub parameters: Vec<ParamSpec>,
}

impl ToolDescriptor {
    /// JSON schema of the tool's argument object
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            let mut schema = json!({
                "type": param.kind,
                "description": param.description,
            });
            if param.kind == "array" {
                schema["items"] = json!({"type": "string"});
            }
            if let Some(default) = &param.default {
                schema["default"] = default.clone();
            }
            properties.insert(param.name.to_string(), schema);
        }

        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }
}

/// All tools, one per intent kind
pub fn catalog() -> &'static [ToolDescriptor] {
    &CATALOG
}

static CATALOG: Lazy<Vec<ToolDescriptor>> = Lazy::new(|| {
    IntentKind::ALL
        .into_iter()
        .map(|intent| ToolDescriptor {
            name: intent.tool_name(),
            intent,
            description: description(intent),
            parameters: parameters(intent),
        })
        .collect()
});

fn description(intent: IntentKind) -> &'static str {
    match intent {
        IntentKind::ByTarget => {
            "Search the ALMA archive for observations of a named astronomical object (resolved via SIMBAD)."
        }
        IntentKind::ByPosition => "Cone search of the ALMA archive around ICRS coordinates.",
        IntentKind::ByFrequency => "Find observations whose frequency lies in a range (GHz).",
        IntentKind::ByResolution => "Find observations within an angular resolution range (arcsec).",
        IntentKind::ByProposal => "Search by proposal ID, PI name or science category.",
        IntentKind::LineCoverage => {
            "Check whether observations of a target cover a spectral line at a given redshift."
        }
        IntentKind::ByBibliography => "Find observations used in publications.",
        IntentKind::ByMemberOus => "Look up datasets by Member OUS identifier.",
        IntentKind::ByDataType => "Search for spectral cubes or continuum images.",
        IntentKind::ByScienceKeyword => "Search by ALMA science keyword.",
        IntentKind::ByAbstract => "Search proposal (and optionally publication) abstracts.",
        IntentKind::BySensitivity => "Find observations at or below a sensitivity limit (mJy/beam).",
        IntentKind::RawQuery => "Run a custom ADQL query against ivoa.obscore.",
        IntentKind::BySourceName => "Match the target name as written by the PI, without name resolution.",
        IntentKind::MultiSource => "Query the archive for several named sources at once.",
        IntentKind::InfoLookup => "Describe ALMA bands, common spectral lines and science categories.",
        IntentKind::ResolveTarget => "Resolve an object name to ICRS coordinates.",
    }
}

fn parameters(intent: IntentKind) -> Vec<ParamSpec> {
    use ParamSpec as P;

    let radius = || P::optional("radius_arcmin", "number", "Search radius in arcminutes").with_default(json!(1.0));
    let public_only = || P::optional("public_only", "boolean", "Only public data").with_default(json!(true));
    let target_filter = || P::optional("target_name", "string", "Substring filter on target name");
    let band = || P::optional("band", "integer", "ALMA band number (1-10)");

    match intent {
        IntentKind::ByTarget => vec![
            P::required("target_name", "string", "Object name, e.g. \"M87\""),
            radius(),
            public_only(),
        ],
        IntentKind::ByPosition => vec![
            P::required("ra_degrees", "number", "Right ascension in degrees [0, 360)"),
            P::required("dec_degrees", "number", "Declination in degrees [-90, 90]"),
            radius(),
            public_only(),
        ],
        IntentKind::ByFrequency => vec![
            P::required("min_freq_ghz", "number", "Lower frequency bound in GHz"),
            P::required("max_freq_ghz", "number", "Upper frequency bound in GHz"),
            target_filter(),
        ],
        IntentKind::ByResolution => vec![
            P::required("max_resolution_arcsec", "number", "Coarsest resolution in arcsec"),
            P::optional("min_resolution_arcsec", "number", "Finest resolution in arcsec").with_default(json!(0.0)),
            target_filter(),
        ],
        IntentKind::ByProposal => vec![
            P::optional("proposal_id", "string", "Proposal ID, e.g. 2023.1.00001.S"),
            P::optional("pi_name", "string", "PI name (partial match)"),
            P::optional("science_category", "string", "Science category, e.g. \"Galaxy evolution\""),
        ],
        IntentKind::LineCoverage => vec![
            P::required("target_name", "string", "Object name"),
            P::required("line_frequency_ghz", "number", "Rest frequency of the line in GHz"),
            P::optional("redshift", "number", "Source redshift").with_default(json!(0.0)),
        ],
        IntentKind::ByBibliography => vec![
            P::optional("bibcode", "string", "ADS bibcode (partial match)"),
            P::optional("journal_name", "string", "Journal name substring"),
            P::optional("first_author", "string", "First author (partial match)"),
            P::optional("publication_year", "integer", "Year of publication"),
        ],
        IntentKind::ByMemberOus => vec![P::required(
            "member_ous_id",
            "string",
            "uid://A001/X123/X456 or uid___A001_X123_X456",
        )],
        IntentKind::ByDataType => vec![
            P::required("data_type", "string", "\"cube\" or \"image\""),
            target_filter(),
            P::optional("science_keyword", "string", "Science keyword filter"),
            band(),
        ],
        IntentKind::ByScienceKeyword => vec![
            P::required("science_keyword", "string", "Science keyword, e.g. \"Quasars\""),
            P::optional("data_type", "string", "\"cube\" or \"image\""),
            band(),
            P::optional("science_observation_only", "boolean", "Only science observations").with_default(json!(true)),
        ],
        IntentKind::ByAbstract => vec![
            P::required("search_terms", "string", "Words to look for"),
            P::optional("search_pub_abstract", "boolean", "Also search publication abstracts").with_default(json!(false)),
        ],
        IntentKind::BySensitivity => vec![
            P::required("max_sensitivity_mjy", "number", "Sensitivity limit in mJy/beam"),
            P::optional("sensitivity_type", "string", "\"continuum\" or \"line\"").with_default(json!("continuum")),
            target_filter(),
            band(),
        ],
        IntentKind::RawQuery => vec![
            P::required("sql_query", "string", "ADQL against ivoa.obscore"),
            P::optional("max_rows", "integer", "Row limit (1-1000)").with_default(json!(100)),
        ],
        IntentKind::BySourceName => vec![
            P::required("source_name", "string", "Name as given by the PI"),
            P::optional("exact_match", "boolean", "Exact instead of substring match").with_default(json!(false)),
        ],
        IntentKind::MultiSource => vec![
            P::required("source_names", "array", "Object names"),
            radius(),
        ],
        IntentKind::InfoLookup => vec![],
        IntentKind::ResolveTarget => vec![P::required("target_name", "string", "Object name")],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_covers_every_intent() {
        assert_eq!(catalog().len(), IntentKind::ALL.len());
        for tool in catalog() {
            assert_eq!(tool.name, tool.intent.tool_name());
        }
    }

    #[test]
    fn test_input_schema() {
        let tool = catalog()
            .iter()
            .find(|t| t.intent == IntentKind::ByFrequency)
            .unwrap();
        let schema = tool.input_schema();

        assert_eq!(schema["required"], json!(["min_freq_ghz", "max_freq_ghz"]));
        assert_eq!(schema["properties"]["target_name"]["type"], json!("string"));
    }
}
