//! Query sets over a row store table.
//!
//! A `QuerySet` fetches the rows and columns of a table once and can then be
//! filtered any number of times. Filtering never touches the receiver: it
//! works on a private copy of the snapshot and returns a new query set whose
//! materialized rows are the result. Terminal operations read the
//! materialized rows or write them back through the store.

use crate::column::ColumnSchema;
use crate::condition::evaluate_condition;
use crate::error::QueryResult;
use crate::row::{apply_patch, row_id, Row, RowId};
use crate::store::RowStore;
use chrono::FixedOffset;
use log::debug;
use std::fmt;
use std::sync::Arc;

/// Rows and columns of a table as fetched from the store
#[derive(Debug, Clone, Default, PartialEq)]
struct Snapshot {
    rows: Vec<Row>,
    columns: Vec<ColumnSchema>,
}

#[derive(Clone)]
pub struct QuerySet {
    store: Arc<dyn RowStore>,
    table: String,
    /// View to fetch from instead of the whole table
    view: Option<String>,
    /// Offset for ctime/mtime cells; local time when unset
    utc_offset: Option<FixedOffset>,
    snapshot: Option<Snapshot>,
    /// Condition of the last filter
    conditions: String,
    /// Rows selected by the last `all`/`filter`
    rows: Option<Vec<Row>>,
}

impl QuerySet {
    /// Create an unfiltered query set; nothing is fetched yet
    pub fn new(store: Arc<dyn RowStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
            view: None,
            utc_offset: None,
            snapshot: None,
            conditions: String::new(),
            rows: None,
        }
    }

    /// Create a query set over rows and columns that were already fetched
    pub fn from_snapshot(
        store: Arc<dyn RowStore>,
        table: impl Into<String>,
        rows: Vec<Row>,
        columns: Vec<ColumnSchema>,
    ) -> Self {
        let mut qs = Self::new(store, table);
        qs.snapshot = Some(Snapshot { rows, columns });
        qs
    }

    /// Fetch from a view of the table
    pub fn with_view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    /// Compare ctime/mtime cells in this offset instead of local time
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = Some(offset);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn conditions(&self) -> &str {
        &self.conditions
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Materialized rows, if `all` or `filter` produced this query set
    pub fn rows(&self) -> Option<&[Row]> {
        self.rows.as_deref()
    }

    /// Fetch rows and columns from the store, replacing any earlier snapshot
    /// and clearing the materialized rows.
    pub fn load(&mut self) -> QueryResult<()> {
        let view = self.view.as_deref();
        let rows = self.store.fetch_rows(&self.table, view)?;
        let columns = self.store.fetch_columns(&self.table, view)?;
        debug!(
            "loaded {} rows and {} columns from table {}",
            rows.len(),
            columns.len(),
            self.table
        );

        self.snapshot = Some(Snapshot { rows, columns });
        self.rows = None;
        self.conditions.clear();
        Ok(())
    }

    /// Copy of this query set with a snapshot, fetching one if needed
    fn loaded_copy(&self) -> QueryResult<QuerySet> {
        let mut qs = self.clone();
        if qs.snapshot.is_none() {
            qs.load()?;
        }
        Ok(qs)
    }

    /// Return a new query set holding the snapshot rows that match
    /// `conditions`.
    ///
    /// The condition is always evaluated against the whole snapshot, never
    /// against rows an earlier filter selected. An empty condition keeps
    /// every row.
    pub fn filter(&self, conditions: &str) -> QueryResult<QuerySet> {
        let mut qs = self.loaded_copy()?;
        let filtered = match qs.snapshot.as_ref() {
            Some(snapshot) => {
                evaluate_condition(&snapshot.rows, &snapshot.columns, conditions, qs.utc_offset)?
            }
            None => Vec::new(),
        };
        debug!(
            "filter `{}` on table {} selected {} rows",
            conditions,
            qs.table,
            filtered.len()
        );

        qs.conditions = conditions.to_string();
        qs.rows = Some(filtered);
        Ok(qs)
    }

    /// Return a new query set materializing every row of the snapshot
    pub fn all(&self) -> QueryResult<QuerySet> {
        let mut qs = self.loaded_copy()?;
        qs.rows = qs.snapshot.as_ref().map(|snapshot| snapshot.rows.clone());
        qs.conditions.clear();
        Ok(qs)
    }

    /// First matching row
    pub fn get(&self) -> Option<&Row> {
        self.first()
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.as_ref().and_then(|rows| rows.first())
    }

    pub fn last(&self) -> Option<&Row> {
        self.rows.as_ref().and_then(|rows| rows.last())
    }

    pub fn count(&self) -> usize {
        self.rows.as_ref().map_or(0, Vec::len)
    }

    pub fn exists(&self) -> bool {
        self.count() > 0
    }

    /// Apply `patch` to every materialized row, one store request per row in
    /// order, merging the patch into the local copy after each success.
    ///
    /// Stops at the first failing request; rows updated before it stay
    /// updated both in the store and locally.
    pub fn update(&mut self, patch: &Row) -> QueryResult<&[Row]> {
        let Some(rows) = self.rows.as_mut() else {
            return Ok(&[]);
        };

        for row in rows.iter_mut() {
            let id = row_id(row)?;
            self.store.update_row(&self.table, &id, patch)?;
            apply_patch(row, patch);
        }
        debug!("updated {} rows in table {}", rows.len(), self.table);

        Ok(rows.as_slice())
    }

    /// Delete every materialized row with a single batched request and
    /// return how many deletions were requested.
    pub fn delete(&self) -> QueryResult<usize> {
        let ids = self
            .rows
            .iter()
            .flatten()
            .map(row_id)
            .collect::<QueryResult<Vec<RowId>>>()?;
        if ids.is_empty() {
            return Ok(0);
        }

        self.store.batch_delete_rows(&self.table, &ids)?;
        debug!("requested deletion of {} rows from table {}", ids.len(), self.table);
        Ok(ids.len())
    }
}

impl fmt::Debug for QuerySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySet")
            .field("table", &self.table)
            .field("view", &self.view)
            .field("conditions", &self.conditions)
            .field("loaded", &self.snapshot.is_some())
            .field("rows", &self.rows.as_ref().map(Vec::len))
            .finish()
    }
}

/// Fetch a table and filter it in one step
pub fn query(
    store: Arc<dyn RowStore>,
    table: impl Into<String>,
    conditions: &str,
) -> QueryResult<QuerySet> {
    QuerySet::new(store, table).filter(conditions)
}
