//! Row store backed by a JSON data file.
//!
//! The file holds `{"tables": {"<name>": {"columns": [...], "rows": [...],
//! "views": {...}}}}`. It is read once on open and rewritten after every
//! successful mutation.

use super::memory::{MemoryStore, TableData};
use super::{RowStore, StoreResult};
use crate::column::ColumnSchema;
use crate::row::{Row, RowId};
use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct DataFile {
    #[serde(default)]
    tables: BTreeMap<String, TableData>,
}

pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
    /// Held across a mutation and the rewrite of the file
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open an existing data file
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let contents = fs::read_to_string(&path)?;
        let data: DataFile = serde_json::from_str(&contents)?;
        debug!(
            "opened {} with {} tables",
            path.display(),
            data.tables.len()
        );
        Ok(Self {
            path,
            inner: MemoryStore::from_tables(data.tables),
            write_lock: Mutex::new(()),
        })
    }

    /// Write a new data file holding `tables` and open it
    pub fn create(path: impl AsRef<Path>, tables: BTreeMap<String, TableData>) -> StoreResult<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            inner: MemoryStore::from_tables(tables),
            write_lock: Mutex::new(()),
        };
        store.persist()?;
        Ok(store)
    }

    /// Write the current tables back to the data file.
    ///
    /// The file is replaced by rename so readers never see a partial write.
    fn persist(&self) -> StoreResult<()> {
        let data = DataFile {
            tables: self.inner.tables(),
        };
        let contents = serde_json::to_string_pretty(&data)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        debug!("persisted {}", self.path.display());
        Ok(())
    }

    /// Apply a mutation to the tables and write the result to the file.
    ///
    /// If the file cannot be written the tables are restored, so memory and
    /// file never disagree.
    fn mutate<T>(&self, apply: impl FnOnce(&MemoryStore) -> StoreResult<T>) -> StoreResult<T> {
        let _guard = self.write_lock.lock();
        let before = self.inner.tables();
        let result = apply(&self.inner)?;
        if let Err(e) = self.persist() {
            warn!("failed to persist {}, rolling back: {}", self.path.display(), e);
            self.inner.replace_tables(before);
            return Err(e);
        }
        Ok(result)
    }
}

impl RowStore for JsonFileStore {
    fn fetch_rows(&self, table: &str, view: Option<&str>) -> StoreResult<Vec<Row>> {
        self.inner.fetch_rows(table, view)
    }

    fn fetch_columns(&self, table: &str, view: Option<&str>) -> StoreResult<Vec<ColumnSchema>> {
        self.inner.fetch_columns(table, view)
    }

    fn update_row(&self, table: &str, row_id: &RowId, patch: &Row) -> StoreResult<Row> {
        self.mutate(|inner| inner.update_row(table, row_id, patch))
    }

    fn batch_delete_rows(&self, table: &str, row_ids: &[RowId]) -> StoreResult<()> {
        self.mutate(|inner| inner.batch_delete_rows(table, row_ids))
    }
}
