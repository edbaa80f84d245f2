//! Search intents
//!
//! An intent is one kind of archive request together with its typed
//! parameter record. Intents arrive as a tool name plus a loosely-typed JSON
//! object and are converted here, at the boundary, into [`Intent`] values.

mod catalog;
mod params;
mod validate;

pub use catalog::{catalog, ParamSpec, ToolDescriptor};
pub use params::*;
pub use validate::{Limits, ParamError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Enumerated search kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    ByTarget,
    ByPosition,
    ByFrequency,
    ByResolution,
    ByProposal,
    LineCoverage,
    ByBibliography,
    ByMemberOus,
    ByDataType,
    ByScienceKeyword,
    ByAbstract,
    BySensitivity,
    RawQuery,
    BySourceName,
    MultiSource,
    InfoLookup,
    ResolveTarget,
}

impl IntentKind {
    /// Every intent kind, in catalog order
    pub const ALL: [IntentKind; 17] = [
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
        IntentKind::MultiSource,
        IntentKind::InfoLookup,
        IntentKind::ResolveTarget,
    ];

    /// Tool name exposed to the calling agent
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::ByTarget => "search_by_target",
            Self::ByPosition => "search_by_position",
            Self::ByFrequency => "search_by_frequency",
            Self::ByResolution => "search_by_resolution",
            Self::ByProposal => "search_by_proposal",
            Self::LineCoverage => "check_line_coverage",
            Self::ByBibliography => "search_by_bibliography",
            Self::ByMemberOus => "search_by_member_ous",
            Self::ByDataType => "search_by_data_type",
            Self::ByScienceKeyword => "search_by_science_keyword",
            Self::ByAbstract => "search_by_abstract",
            Self::BySensitivity => "search_by_sensitivity",
            Self::RawQuery => "run_tap_query",
            Self::BySourceName => "search_by_source_name",
            Self::MultiSource => "query_multiple_sources",
            Self::InfoLookup => "get_alma_info",
            Self::ResolveTarget => "resolve_target",
        }
    }

    /// Look up an intent kind by tool name
    pub fn from_tool_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tool_name() == name)
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tool_name())
    }
}

/// A search request with its typed parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "intent", content = "params", rename_all = "snake_case")]
pub enum Intent {
    ByTarget(TargetSearch),
    ByPosition(PositionSearch),
    ByFrequency(FrequencySearch),
    ByResolution(ResolutionSearch),
    ByProposal(ProposalSearch),
    LineCoverage(LineCoverageSearch),
    ByBibliography(BibliographySearch),
    ByMemberOus(MemberOusSearch),
    ByDataType(DataTypeSearch),
    ByScienceKeyword(ScienceKeywordSearch),
    ByAbstract(AbstractSearch),
    BySensitivity(SensitivitySearch),
    RawQuery(RawQuery),
    BySourceName(SourceNameSearch),
    MultiSource(MultiSourceSearch),
    InfoLookup,
    ResolveTarget(ResolveTarget),
}

impl Intent {
    /// Kind of this intent
    pub fn kind(&self) -> IntentKind {
        match self {
            Self::ByTarget(_) => IntentKind::ByTarget,
            Self::ByPosition(_) => IntentKind::ByPosition,
            Self::ByFrequency(_) => IntentKind::ByFrequency,
            Self::ByResolution(_) => IntentKind::ByResolution,
            Self::ByProposal(_) => IntentKind::ByProposal,
            Self::LineCoverage(_) => IntentKind::LineCoverage,
            Self::ByBibliography(_) => IntentKind::ByBibliography,
            Self::ByMemberOus(_) => IntentKind::ByMemberOus,
            Self::ByDataType(_) => IntentKind::ByDataType,
            Self::ByScienceKeyword(_) => IntentKind::ByScienceKeyword,
            Self::ByAbstract(_) => IntentKind::ByAbstract,
            Self::BySensitivity(_) => IntentKind::BySensitivity,
            Self::RawQuery(_) => IntentKind::RawQuery,
            Self::BySourceName(_) => IntentKind::BySourceName,
            Self::MultiSource(_) => IntentKind::MultiSource,
            Self::InfoLookup => IntentKind::InfoLookup,
            Self::ResolveTarget(_) => IntentKind::ResolveTarget,
        }
    }

    /// Build an intent from a tool name and its JSON arguments
    ///
    /// Missing required parameters, wrong types and unknown parameters are
    /// reported as [`ParamError`]s; domain checks happen in
    /// [`Intent::validate`].
    pub fn from_tool_call(tool: &str, arguments: Value) -> Result<Self, ParamError> {
        let kind = IntentKind::from_tool_name(tool)
            .ok_or_else(|| ParamError::new("name", format!("unknown tool '{}'", tool)))?;
        Self::from_params(kind, arguments)
    }

    /// Build an intent of a known kind from JSON arguments
    pub fn from_params(kind: IntentKind, arguments: Value) -> Result<Self, ParamError> {
        let arguments = match arguments {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };

        fn parse<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T, ParamError> {
            serde_json::from_value(arguments).map_err(ParamError::from_serde)
        }

        Ok(match kind {
            IntentKind::ByTarget => Self::ByTarget(parse(arguments)?),
            IntentKind::ByPosition => Self::ByPosition(parse(arguments)?),
            IntentKind::ByFrequency => Self::ByFrequency(parse(arguments)?),
            IntentKind::ByResolution => Self::ByResolution(parse(arguments)?),
            IntentKind::ByProposal => Self::ByProposal(parse(arguments)?),
            IntentKind::LineCoverage => Self::LineCoverage(parse(arguments)?),
            IntentKind::ByBibliography => Self::ByBibliography(parse(arguments)?),
            IntentKind::ByMemberOus => Self::ByMemberOus(parse(arguments)?),
            IntentKind::ByDataType => Self::ByDataType(parse(arguments)?),
            IntentKind::ByScienceKeyword => Self::ByScienceKeyword(parse(arguments)?),
            IntentKind::ByAbstract => Self::ByAbstract(parse(arguments)?),
            IntentKind::BySensitivity => Self::BySensitivity(parse(arguments)?),
            IntentKind::RawQuery => Self::RawQuery(parse(arguments)?),
            IntentKind::BySourceName => Self::BySourceName(parse(arguments)?),
            IntentKind::MultiSource => Self::MultiSource(parse(arguments)?),
            IntentKind::InfoLookup => {
                let extra = arguments.as_object().map(|o| o.len()).unwrap_or(1);
                if extra > 0 {
                    return Err(ParamError::new("arguments", "get_alma_info takes no parameters"));
                }
                Self::InfoLookup
            }
            IntentKind::ResolveTarget => Self::ResolveTarget(parse(arguments)?),
        })
    }

    /// Parameters as a JSON object, for logging and error reports
    pub fn parameters(&self) -> Value {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => map.remove("params").unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_names_round_trip() {
        for kind in IntentKind::ALL {
            assert_eq!(IntentKind::from_tool_name(kind.tool_name()), Some(kind));
        }
        assert_eq!(IntentKind::from_tool_name("search_google"), None);
    }

    #[test]
    fn test_from_tool_call() {
        let intent = Intent::from_tool_call(
            "search_by_position",
            json!({"ra_degrees": 187.7, "dec_degrees": 12.39}),
        )
        .unwrap();

        assert_eq!(intent.kind(), IntentKind::ByPosition);
        match intent {
            Intent::ByPosition(p) => {
                assert_eq!(p.radius_arcmin, 1.0);
                assert!(p.public_only);
            }
            other => panic!("unexpected intent: {other:?}"),
        }
    }

    #[test]
    fn test_missing_required_field() {
        let err = Intent::from_tool_call("search_by_target", json!({})).unwrap_err();
        assert!(err.to_string().contains("target_name"));
    }

    #[test]
    fn test_unknown_tool() {
        let err = Intent::from_tool_call("search_by_vibes", json!({})).unwrap_err();
        assert!(err.to_string().contains("unknown tool"));
    }

    #[test]
    fn test_info_lookup_takes_no_arguments() {
        assert_eq!(
            Intent::from_tool_call("get_alma_info", Value::Null).unwrap(),
            Intent::InfoLookup
        );
        assert!(Intent::from_tool_call("get_alma_info", json!({"band": 3})).is_err());
    }

    #[test]
    fn test_parameters_view() {
        let intent = Intent::ByMemberOus(MemberOusSearch {
            member_ous_id: "uid://A001/X1/X2".to_string(),
        });
        assert_eq!(intent.parameters(), json!({"member_ous_id": "uid://A001/X1/X2"}));
        assert_eq!(Intent::InfoLookup.parameters(), Value::Null);
    }
}
