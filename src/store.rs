//! Row store collaborator.
//!
//! A `RowStore` holds the authoritative rows and column schemas of a set of
//! tables and applies row mutations. Query sets fetch a snapshot from it once
//! and write updates and deletions back through it.

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::{MemoryStore, TableData};

use crate::column::ColumnSchema;
use crate::row::{Row, RowId};
use thiserror::Error;

/// Errors reported by a row store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("View not found: {view} in table {table}")]
    ViewNotFound { table: String, view: String },

    #[error("Row not found: {row_id} in table {table}")]
    RowNotFound { table: String, row_id: RowId },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for row store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Source of rows and column schemas, and sink for row mutations
pub trait RowStore: Send + Sync {
    /// Fetch every row of a table, or of one of its views
    fn fetch_rows(&self, table: &str, view: Option<&str>) -> StoreResult<Vec<Row>>;

    /// Fetch the column schema of a table
    fn fetch_columns(&self, table: &str, view: Option<&str>) -> StoreResult<Vec<ColumnSchema>>;

    /// Merge `patch` into one row and return the row as stored afterwards
    fn update_row(&self, table: &str, row_id: &RowId, patch: &Row) -> StoreResult<Row>;

    /// Delete a batch of rows in one request
    fn batch_delete_rows(&self, table: &str, row_ids: &[RowId]) -> StoreResult<()>;
}
