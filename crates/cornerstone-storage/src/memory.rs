//! In-memory repository.

use std::collections::BTreeMap;

use async_trait::async_trait;
use cornerstone_core::{Record, Result};
use tokio::sync::RwLock;

use crate::repository::{
    Edit, Repository, apply_delete, apply_insert, apply_modify, apply_update, fetch,
};

/// A repository held entirely in memory. Contents are lost on drop.
pub struct MemoryRepository<T> {
    records: RwLock<BTreeMap<String, T>>,
}

impl<T: Record> MemoryRepository<T> {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a repository pre-filled with `records`, keyed by their ids.
    ///
    /// Records are taken as-is, without stamping or validation.
    pub fn with_records(records: impl IntoIterator<Item = T>) -> Self {
        let map = records
            .into_iter()
            .map(|r| (r.id().to_string(), r))
            .collect();
        Self {
            records: RwLock::new(map),
        }
    }
}

impl<T: Record> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Record> Repository<T> for MemoryRepository<T> {
    async fn list(&self) -> Result<Vec<T>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<T> {
        fetch(&*self.records.read().await, id)
    }

    async fn insert(&self, record: T) -> Result<T> {
        apply_insert(&mut *self.records.write().await, record)
    }

    async fn update(&self, id: &str, record: T) -> Result<T> {
        apply_update(&mut *self.records.write().await, id, record)
    }

    async fn modify<'a>(&'a self, id: &'a str, edit: Edit<'a, T>) -> Result<T> {
        apply_modify(&mut *self.records.write().await, id, edit)
    }

    async fn delete(&self, id: &str) -> Result<T> {
        apply_delete(&mut *self.records.write().await, id)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
