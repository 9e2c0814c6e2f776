//! Error types for condition parsing, evaluation and query execution.

use crate::column::ColumnType;
use crate::condition::CompareOp;
use crate::store::StoreError;
use thiserror::Error;

/// Errors that can occur while filtering or mutating a query set.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Lex error: {0}")]
    Lex(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{column_type} type column does not support the query method '{operator}'")]
    UnsupportedOperation {
        column_type: ColumnType,
        operator: CompareOp,
    },

    #[error("Invalid {column_type} literal \"{value}\": {reason}")]
    InvalidLiteral {
        column_type: ColumnType,
        value: String,
        reason: String,
    },

    #[error("Unexpected data shape: {0}")]
    Shape(String),

    #[error("Remote request failed: {0}")]
    RemoteRequest(#[from] StoreError),
}

impl QueryError {
    pub(crate) fn invalid_literal(
        column_type: ColumnType,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        QueryError::InvalidLiteral {
            column_type,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;
