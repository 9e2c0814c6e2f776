//! Rows as handed out by a row store, and their identity.

use crate::error::{QueryError, QueryResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A row: column name to raw cell, plus the `_id` identity field
pub type Row = Map<String, Value>;

/// Name of the identity field every row carries
pub const ROW_ID_FIELD: &str = "_id";

/// Stable identity of a row
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub String);

impl RowId {
    pub fn new(id: impl Into<String>) -> Self {
        RowId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the identity of a row.
///
/// String and numeric `_id` values are accepted; anything else means the
/// store handed out a malformed row.
pub fn row_id(row: &Row) -> QueryResult<RowId> {
    match row.get(ROW_ID_FIELD) {
        Some(Value::String(id)) => Ok(RowId(id.clone())),
        Some(Value::Number(id)) => Ok(RowId(id.to_string())),
        Some(other) => Err(QueryError::Shape(format!(
            "row identity must be a string or number, got {}",
            other
        ))),
        None => Err(QueryError::Shape(format!(
            "row has no {} field",
            ROW_ID_FIELD
        ))),
    }
}

/// Copy every field of `patch` into `row`, overwriting existing cells
pub fn apply_patch(row: &mut Row, patch: &Row) {
    for (key, value) in patch {
        row.insert(key.clone(), value.clone());
    }
}
