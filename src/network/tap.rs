//! Table Access Protocol (TAP) synchronous query client
//!
//! Both the ALMA archive and SIMBAD expose a TAP `sync` endpoint. A query is
//! posted as ADQL and answered with a tab-separated table whose first line
//! holds the column names.

use super::client::HttpClient;
use crate::results::ResultSet;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Failure of a TAP query
#[derive(Debug, Error)]
pub enum TapError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("service error: {0}")]
    Service(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Client for one TAP service
#[derive(Clone)]
pub struct TapService {
    client: HttpClient,
    base_url: String,
}

impl TapService {
    /// Create a client for the service rooted at `base_url`
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Service base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run an ADQL query synchronously
    pub async fn query(&self, adql: &str) -> Result<ResultSet, TapError> {
        let url = format!("{}/sync", self.base_url);
        debug!("TAP query to {}: {}", url, adql);

        let form = [
            ("REQUEST", "doQuery"),
            ("LANG", "ADQL"),
            ("FORMAT", "tsv"),
            ("QUERY", adql),
        ];

        let response = self
            .client
            .post_form(&url, &form)
            .await
            .map_err(|e| TapError::Transport(e.to_string()))?;

        if response.is_rate_limited() {
            return Err(TapError::Http {
                status: response.status,
                message: "rate limited by service".to_string(),
            });
        }

        if !response.is_success() {
            return Err(TapError::Http {
                status: response.status,
                message: error_message(&response.text),
            });
        }

        // Errors may come back as a VOTable document even with a 200 status
        if looks_like_votable(&response.text) {
            return Err(TapError::Service(error_message(&response.text)));
        }

        parse_tsv(&response.text)
    }
}

fn looks_like_votable(body: &str) -> bool {
    let head = body.trim_start();
    head.starts_with("<?xml") || head.starts_with("<VOTABLE")
}

/// Pull the human-readable error out of a TAP error document
fn error_message(body: &str) -> String {
    const MARKER: &str = "value=\"ERROR\"";

    if let Some(pos) = body.find(MARKER) {
        let rest = &body[pos + MARKER.len()..];
        if let Some(start) = rest.find('>') {
            let content = &rest[start + 1..];
            let end = content.find("</INFO>").unwrap_or(content.len());
            let message = content[..end].trim();
            if !message.is_empty() {
                return message.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response".to_string();
    }
    trimmed.chars().take(500).collect()
}

/// Identifier and list columns that stay text even when a cell looks numeric
const TEXT_COLUMNS: &[&str] = &[
    "band_list",
    "obs_id",
    "proposal_id",
    "project_code",
    "member_ous_uid",
    "group_ous_uid",
    "target_name",
    "main_id",
    "bib_reference",
];

/// Parse a TSV table with a header line
pub fn parse_tsv(body: &str) -> Result<ResultSet, TapError> {
    let mut lines = body.lines().filter(|l| !l.trim().is_empty());

    let header = lines
        .next()
        .ok_or_else(|| TapError::Malformed("missing header line".to_string()))?;
    let columns: Vec<String> = header.split('\t').map(|c| unquote(c).to_string()).collect();

    let text: Vec<bool> = columns
        .iter()
        .map(|c| TEXT_COLUMNS.contains(&c.as_str()))
        .collect();

    let mut table = ResultSet::new(columns.clone());
    for (line_no, line) in lines.enumerate() {
        let cells: Vec<&str> = line.split('\t').collect();
        if cells.len() != columns.len() {
            return Err(TapError::Malformed(format!(
                "row {} has {} cells, expected {}",
                line_no + 1,
                cells.len(),
                columns.len()
            )));
        }
        table.push_values(
            cells
                .into_iter()
                .zip(&text)
                .map(|(cell, &is_text)| if is_text { text_cell(cell) } else { parse_cell(cell) })
                .collect(),
        );
    }

    Ok(table)
}

fn unquote(cell: &str) -> &str {
    let cell = cell.trim();
    cell.strip_prefix('"')
        .and_then(|c| c.strip_suffix('"'))
        .unwrap_or(cell)
}

fn text_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    Value::String(unquote(trimmed).replace("\"\"", "\""))
}

/// Numbers become JSON numbers; non-finite values have no JSON form and become null
fn parse_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        return Value::String(unquote(trimmed).replace("\"\"", "\""));
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            return Value::from(f);
        }
        return Value::Null;
    }
    Value::String(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_tsv() {
        let body = "target_name\ts_ra\tband_list\tt_exptime\nM87\t187.7059\t3 6\t\nNGC 253\t11.888\t7\t1512\n";
        let table = parse_tsv(body).unwrap();

        assert_eq!(table.columns, vec!["target_name", "s_ra", "band_list", "t_exptime"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0]["target_name"], json!("M87"));
        assert_eq!(table.rows[0]["s_ra"], json!(187.7059));
        assert_eq!(table.rows[0]["t_exptime"], Value::Null);
        assert_eq!(table.rows[1]["t_exptime"], json!(1512));
    }

    #[test]
    fn test_parse_tsv_keeps_identifier_columns_as_text() {
        let body = "band_list\tproposal_id\tobs_id\tt_exptime\n7\t2019\t123\t60\n3 6\t2019.1.00001.S\tuid://A001\t30\n";
        let table = parse_tsv(body).unwrap();

        assert_eq!(table.rows[0]["band_list"], json!("7"));
        assert_eq!(table.rows[0]["proposal_id"], json!("2019"));
        assert_eq!(table.rows[0]["obs_id"], json!("123"));
        assert_eq!(table.rows[0]["t_exptime"], json!(60));
        assert_eq!(table.rows[1]["band_list"], json!("3 6"));
    }

    #[test]
    fn test_parse_tsv_quoted_strings() {
        let body = "\"main_id\"\t\"ra\"\n\"M  87\"\t187.70593\n";
        let table = parse_tsv(body).unwrap();
        assert_eq!(table.columns, vec!["main_id", "ra"]);
        assert_eq!(table.rows[0]["main_id"], json!("M  87"));
    }

    #[test]
    fn test_parse_tsv_header_only_is_empty() {
        let table = parse_tsv("target_name\ts_ra\n").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns.len(), 2);
    }

    #[test]
    fn test_parse_tsv_ragged_row() {
        let err = parse_tsv("a\tb\n1\n").unwrap_err();
        assert!(matches!(err, TapError::Malformed(_)));
    }

    #[test]
    fn test_error_message_from_votable() {
        let body = r#"<?xml version="1.0"?><VOTABLE><RESOURCE type="results"><INFO name="QUERY_STATUS" value="ERROR">Column not found: foo</INFO></RESOURCE></VOTABLE>"#;
        assert_eq!(error_message(body), "Column not found: foo");
        assert_eq!(error_message("   "), "empty response");
    }

    #[tokio::test]
    async fn test_query_against_mock_service() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tap/sync"))
            .and(body_string_contains("LANG=ADQL"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("target_name\tfrequency\nM87\t230.5\n"),
            )
            .mount(&server)
            .await;

        let service = TapService::new(HttpClient::new().unwrap(), format!("{}/tap/", server.uri()));
        let table = service
            .query("SELECT TOP 1 target_name, frequency FROM ivoa.obscore")
            .await
            .unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0]["frequency"], json!(230.5));
    }

    #[tokio::test]
    async fn test_query_reports_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tap/sync"))
            .respond_with(ResponseTemplate::new(400).set_body_string(
                r#"<VOTABLE><INFO name="QUERY_STATUS" value="ERROR">syntax error near WHERE</INFO></VOTABLE>"#,
            ))
            .mount(&server)
            .await;

        let service = TapService::new(HttpClient::new().unwrap(), format!("{}/tap", server.uri()));
        let err = service.query("SELECT WHERE").await.unwrap_err();

        match err {
            TapError::Http { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "syntax error near WHERE");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
