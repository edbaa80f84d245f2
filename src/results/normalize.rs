//! Row normalization
//!
//! Every row of an envelope carries exactly the envelope's columns, in column
//! order, and every value is a scalar.

use super::types::{ResultSet, Row};
use serde_json::Value;

/// Normalize a backend result in place
///
/// Keys found in rows but missing from the column list are appended to it,
/// missing cells become null, and arrays or objects are flattened to their
/// JSON text.
pub fn normalize(table: &mut ResultSet) {
    for row in &table.rows {
        for key in row.keys() {
            if !table.columns.iter().any(|c| c == key) {
                table.columns.push(key.clone());
            }
        }
    }

    let columns = &table.columns;
    for row in &mut table.rows {
        let mut normalized = Row::new();
        for column in columns {
            let value = row.remove(column).unwrap_or(Value::Null);
            normalized.insert(column.clone(), scalar(value));
        }
        *row = normalized;
    }
}

/// Flatten a value to a scalar
pub fn scalar(value: Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
        scalar => scalar,
    }
}
