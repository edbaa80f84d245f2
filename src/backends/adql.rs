//! ADQL query construction helpers

use once_cell::sync::Lazy;
use regex::Regex;

static TOP_CLAUSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bTOP\s+\d+").expect("valid regex"));
static COUNT_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bCOUNT\s*\(").expect("valid regex"));
static SELECT_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*SELECT(\s+(ALL|DISTINCT))?\s").expect("valid regex"));

/// Quote a string literal (single quotes doubled)
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Case-insensitive substring match
pub fn contains_ci(column: &str, needle: &str) -> String {
    format!(
        "LOWER({}) LIKE {}",
        column,
        quote(&format!("%{}%", needle.trim().to_lowercase()))
    )
}

/// Case-sensitive substring match
pub fn contains(column: &str, needle: &str) -> String {
    format!("{} LIKE {}", column, quote(&format!("%{}%", needle.trim())))
}

/// Band membership against a space separated `band_list`
pub fn band_in_list(band: u8) -> String {
    format!("(' ' || band_list || ' ') LIKE '% {} %'", band)
}

/// Cone constraint on the ObsCore position columns
pub fn cone(ra_deg: f64, dec_deg: f64, radius_deg: f64) -> String {
    format!(
        "CONTAINS(POINT('ICRS', s_ra, s_dec), CIRCLE('ICRS', {}, {}, {})) = 1",
        ra_deg, dec_deg, radius_deg
    )
}

/// Add `TOP n` to a SELECT that has neither a TOP clause nor a COUNT
pub fn ensure_top(sql: &str, max_rows: u32) -> String {
    if TOP_CLAUSE.is_match(sql) || COUNT_CALL.is_match(sql) {
        return sql.to_string();
    }
    match SELECT_HEAD.find(sql) {
        Some(head) => format!(
            "{}TOP {} {}",
            head.as_str(),
            max_rows,
            &sql[head.end()..]
        ),
        None => sql.to_string(),
    }
}

/// Builder for a single-table SELECT
#[derive(Debug, Clone, Default)]
pub struct Select {
    table: String,
    distinct: bool,
    top: Option<u32>,
    columns: Vec<String>,
    conditions: Vec<String>,
    order_by: Option<String>,
}

impl Select {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn top(mut self, rows: u32) -> Self {
        self.top = Some(rows);
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    pub fn filter(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    pub fn filter_opt(self, condition: Option<String>) -> Self {
        match condition {
            Some(c) => self.filter(c),
            None => self,
        }
    }

    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by = Some(column.into());
        self
    }

    pub fn to_adql(&self) -> String {
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        if let Some(top) = self.top {
            sql.push_str(&format!("TOP {} ", top));
        }
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }
        sql.push_str(" FROM ");
        sql.push_str(&self.table);
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }
        if let Some(order) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        sql
    }
}
