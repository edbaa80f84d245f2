//! Result type definitions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One table row: column name to scalar value
pub type Row = Map<String, Value>;

/// Table-like output of a single backend call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Column names in presentation order
    pub columns: Vec<String>,
    /// Rows; keys are expected to be drawn from `columns`
    pub rows: Vec<Row>,
    /// Free-text summary of the result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Extra facts about the query (resolved coordinates, coverage counts, ...)
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl ResultSet {
    /// Create an empty result set with the given columns
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Append a row built from values in column order
    pub fn push_values(&mut self, values: Vec<Value>) {
        let row = self
            .columns
            .iter()
            .cloned()
            .zip(values)
            .collect::<Row>();
        self.rows.push(row);
    }

    /// Append a prepared row
    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Attach a summary
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Attach a metadata entry
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rename columns according to a native -> canonical mapping
    pub fn rename_columns(&mut self, mapping: &[(&str, &str)]) {
        for (native, canonical) in mapping {
            if native == canonical {
                continue;
            }
            let Some(idx) = self.columns.iter().position(|c| c.as_str() == *native) else {
                continue;
            };
            // Never merge into a canonical column that is already taken
            if self.columns.iter().any(|c| c.as_str() == *canonical) {
                continue;
            }
            self.columns[idx] = canonical.to_string();
            for row in &mut self.rows {
                if let Some(value) = row.remove(*native) {
                    row.insert(canonical.to_string(), value);
                }
            }
        }
    }

    /// Values of one column, in row order
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows.iter().filter_map(move |row| row.get(column))
    }

    /// Distinct non-null string values of a column, first-seen order, capped
    pub fn distinct_strings(&self, column: &str, limit: usize) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for value in self.column_values(column) {
            if let Some(s) = value.as_str() {
                if !seen.iter().any(|v| v == s) {
                    seen.push(s.to_string());
                    if seen.len() >= limit {
                        break;
                    }
                }
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_push_values_follows_columns() {
        let mut set = ResultSet::new(["target_name", "s_ra"]);
        set.push_values(vec![json!("M87"), json!(187.7)]);

        assert_eq!(set.len(), 1);
        assert_eq!(set.rows[0]["target_name"], json!("M87"));
        assert_eq!(set.rows[0]["s_ra"], json!(187.7));
    }

    #[test]
    fn test_rename_columns() {
        let mut set = ResultSet::new(["target_name", "s_ra", "band_list"]);
        set.push_values(vec![json!("M87"), json!(187.7), json!("3 6")]);
        set.rename_columns(&[("target_name", "target"), ("s_ra", "ra"), ("band_list", "band")]);

        assert_eq!(set.columns, vec!["target", "ra", "band"]);
        assert_eq!(set.rows[0]["target"], json!("M87"));
        assert!(!set.rows[0].contains_key("s_ra"));
    }

    #[test]
    fn test_rename_keeps_colliding_native_column() {
        let mut set = ResultSet::new(["project_code", "proposal_id"]);
        set.push_values(vec![json!("old"), json!("2019.1.00001.S")]);
        set.rename_columns(&[("project_code", "proposal_id")]);

        assert_eq!(set.columns, vec!["project_code", "proposal_id"]);
        assert_eq!(set.rows[0]["proposal_id"], json!("2019.1.00001.S"));
        assert_eq!(set.rows[0]["project_code"], json!("old"));
    }

    #[test]
    fn test_distinct_strings() {
        let mut set = ResultSet::new(["target"]);
        for name in ["A", "B", "A", "C"] {
            set.push_values(vec![json!(name)]);
        }
        assert_eq!(set.distinct_strings("target", 10), vec!["A", "B", "C"]);
        assert_eq!(set.distinct_strings("target", 2), vec!["A", "B"]);
    }
}
