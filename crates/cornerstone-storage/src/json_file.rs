//! JSON file repository.
//!
//! Each collection is stored as `<data_dir>/<KIND>.json`, a pretty-printed
//! array of records sorted by id. The file is read once at open and
//! rewritten on every mutation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cornerstone_core::{Record, Result};
use tokio::sync::RwLock;

use crate::fs::{read_json, write_json_atomic};
use crate::repository::{
    Edit, Repository, apply_delete, apply_insert, apply_modify, apply_update, fetch,
};

/// A repository persisted as a JSON array on disk.
///
/// Mutations hold the write lock across the file write, so writers are
/// serialized. A mutation is applied to a copy of the collection and only
/// becomes visible once the file has been replaced; a failed write leaves
/// both the file and the in-memory state untouched.
pub struct JsonFileRepository<T> {
    path: PathBuf,
    records: RwLock<BTreeMap<String, T>>,
}

impl<T: Record> JsonFileRepository<T> {
    /// Open the collection for `T` under `data_dir`. A missing file is an
    /// empty collection; the file is created on the first mutation.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let path = data_dir.as_ref().join(format!("{}.json", T::KIND));
        let stored: Vec<T> = read_json(&path).await?.unwrap_or_default();

        let mut records = BTreeMap::new();
        for record in stored {
            if let Some(previous) = records.insert(record.id().to_string(), record) {
                log::warn!(
                    "Duplicate {} id '{}' in {}; keeping the later entry",
                    T::KIND,
                    previous.id(),
                    path.display()
                );
            }
        }

        log::info!(
            "Opened {} collection: {} records from {}",
            T::KIND,
            records.len(),
            path.display()
        );

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `op` to a copy of the collection, persist it, then publish it.
    async fn mutate<F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut BTreeMap<String, T>) -> Result<T> + Send,
    {
        let mut guard = self.records.write().await;
        let mut next = guard.clone();
        let result = op(&mut next)?;
        let rows: Vec<&T> = next.values().collect();
        write_json_atomic(&self.path, &rows).await?;
        *guard = next;
        Ok(result)
    }
}

#[async_trait]
impl<T: Record> Repository<T> for JsonFileRepository<T> {
    async fn list(&self) -> Result<Vec<T>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<T> {
        fetch(&*self.records.read().await, id)
    }

    async fn insert(&self, record: T) -> Result<T> {
        let stored = self.mutate(|records| apply_insert(records, record)).await?;
        log::debug!("Inserted {} '{}'", T::KIND, stored.id());
        Ok(stored)
    }

    async fn update(&self, id: &str, record: T) -> Result<T> {
        let stored = self
            .mutate(|records| apply_update(records, id, record))
            .await?;
        log::debug!("Updated {} '{id}'", T::KIND);
        Ok(stored)
    }

    async fn modify<'a>(&'a self, id: &'a str, edit: Edit<'a, T>) -> Result<T> {
        let stored = self
            .mutate(|records| apply_modify(records, id, edit))
            .await?;
        log::debug!("Modified {} '{id}'", T::KIND);
        Ok(stored)
    }

    async fn delete(&self, id: &str) -> Result<T> {
        let removed = self.mutate(|records| apply_delete(records, id)).await?;
        log::debug!("Deleted {} '{id}'", T::KIND);
        Ok(removed)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }

    fn name(&self) -> &str {
        "json-file"
    }
}
