//! In-memory row store.

use super::{RowStore, StoreError, StoreResult};
use crate::column::ColumnSchema;
use crate::row::{apply_patch, row_id, Row, RowId};
use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Columns, rows and named views of one table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    #[serde(default)]
    pub columns: Vec<ColumnSchema>,
    #[serde(default)]
    pub rows: Vec<Row>,
    /// View name to the identities of the rows it shows
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub views: BTreeMap<String, Vec<RowId>>,
}

impl TableData {
    pub fn new(columns: Vec<ColumnSchema>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            views: BTreeMap::new(),
        }
    }

    fn visible_rows(&self, table: &str, view: Option<&str>) -> StoreResult<Vec<Row>> {
        let Some(view) = view else {
            return Ok(self.rows.clone());
        };
        let ids: HashSet<&RowId> = self
            .views
            .get(view)
            .ok_or_else(|| StoreError::ViewNotFound {
                table: table.to_string(),
                view: view.to_string(),
            })?
            .iter()
            .collect();

        Ok(self
            .rows
            .iter()
            .filter(|row| row_id(row).map_or(false, |id| ids.contains(&id)))
            .cloned()
            .collect())
    }
}

/// Row store keeping every table in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<BTreeMap<String, TableData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tables(tables: BTreeMap<String, TableData>) -> Self {
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Create or replace a table
    pub fn insert_table(&self, name: impl Into<String>, columns: Vec<ColumnSchema>, rows: Vec<Row>) {
        self.tables
            .write()
            .insert(name.into(), TableData::new(columns, rows));
    }

    /// Create or replace a view showing the given rows of a table
    pub fn insert_view(
        &self,
        table: &str,
        view: impl Into<String>,
        row_ids: Vec<RowId>,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let data = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        data.views.insert(view.into(), row_ids);
        Ok(())
    }

    /// Current rows of a table
    pub fn rows(&self, table: &str) -> Option<Vec<Row>> {
        self.tables.read().get(table).map(|data| data.rows.clone())
    }

    /// Copy of every table
    pub fn tables(&self) -> BTreeMap<String, TableData> {
        self.tables.read().clone()
    }

    /// Swap in a complete set of tables
    pub(crate) fn replace_tables(&self, tables: BTreeMap<String, TableData>) {
        *self.tables.write() = tables;
    }
}

impl RowStore for MemoryStore {
    fn fetch_rows(&self, table: &str, view: Option<&str>) -> StoreResult<Vec<Row>> {
        let tables = self.tables.read();
        let data = tables
            .get(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        data.visible_rows(table, view)
    }

    fn fetch_columns(&self, table: &str, view: Option<&str>) -> StoreResult<Vec<ColumnSchema>> {
        let tables = self.tables.read();
        let data = tables
            .get(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        if let Some(view) = view {
            if !data.views.contains_key(view) {
                return Err(StoreError::ViewNotFound {
                    table: table.to_string(),
                    view: view.to_string(),
                });
            }
        }
        Ok(data.columns.clone())
    }

    fn update_row(&self, table: &str, id: &RowId, patch: &Row) -> StoreResult<Row> {
        let mut tables = self.tables.write();
        let data = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        let row = data
            .rows
            .iter_mut()
            .find(|row| row_id(row).map_or(false, |found| &found == id))
            .ok_or_else(|| StoreError::RowNotFound {
                table: table.to_string(),
                row_id: id.clone(),
            })?;

        apply_patch(row, patch);
        debug!("updated row {} in table {}", id, table);
        Ok(row.clone())
    }

    fn batch_delete_rows(&self, table: &str, row_ids: &[RowId]) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let data = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;

        let doomed: HashSet<&RowId> = row_ids.iter().collect();
        let before = data.rows.len();
        data.rows
            .retain(|row| row_id(row).map_or(true, |id| !doomed.contains(&id)));
        debug!(
            "deleted {} of {} requested rows from table {}",
            before - data.rows.len(),
            row_ids.len(),
            table
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnType;
    use serde_json::json;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        let rows: Vec<Row> = serde_json::from_value(json!([
            {"_id": "r1", "name": "a"},
            {"_id": "r2", "name": "b"},
            {"_id": "r3", "name": "c"},
        ]))
        .unwrap();
        store.insert_table(
            "T",
            vec![ColumnSchema::new("name", ColumnType::Text, "0000")],
            rows,
        );
        store
    }

    #[test]
    fn test_fetch() -> StoreResult<()> {
        let store = store();
        assert_eq!(store.fetch_rows("T", None)?.len(), 3);
        assert_eq!(store.fetch_columns("T", None)?[0].name, "name");
        assert!(matches!(
            store.fetch_rows("missing", None),
            Err(StoreError::TableNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_views() -> StoreResult<()> {
        let store = store();
        store.insert_view("T", "odd", vec![RowId::new("r3"), RowId::new("r1")])?;

        let rows = store.fetch_rows("T", Some("odd"))?;
        let names: Vec<&str> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["a", "c"]);

        assert!(store.fetch_columns("T", Some("odd")).is_ok());
        assert!(matches!(
            store.fetch_rows("T", Some("even")),
            Err(StoreError::ViewNotFound { .. })
        ));
        assert!(matches!(
            store.insert_view("missing", "v", vec![]),
            Err(StoreError::TableNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_update_row() -> StoreResult<()> {
        let store = store();
        let patch: Row = serde_json::from_value(json!({"name": "z"})).unwrap();
        let updated = store.update_row("T", &RowId::new("r2"), &patch)?;
        assert_eq!(updated["name"], json!("z"));
        assert_eq!(store.rows("T").unwrap()[1]["name"], json!("z"));

        assert!(matches!(
            store.update_row("T", &RowId::new("r9"), &patch),
            Err(StoreError::RowNotFound { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_batch_delete() -> StoreResult<()> {
        let store = store();
        store.batch_delete_rows("T", &[RowId::new("r1"), RowId::new("r3"), RowId::new("r9")])?;
        let rows = store.rows("T").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["_id"], json!("r2"));
        Ok(())
    }
}
