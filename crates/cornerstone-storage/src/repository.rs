//! The `Repository` trait and the collection rules shared by its backends.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use cornerstone_core::record::{prepare_insert, prepare_replace};
use cornerstone_core::{Error, Record, Result};

/// An in-place edit applied by [`Repository::modify`].
pub type Edit<'a, T> = Box<dyn FnOnce(&mut T) -> Result<()> + Send + 'a>;

/// A collection of records of one kind.
///
/// Backends enforce the same rules:
/// - `insert` trims or generates the id, stamps timestamps, validates, and
///   rejects an id that is already taken
/// - `update` replaces an existing record, keeping its id and `created_at`
/// - `modify` runs its read, edit, and write under one lock
/// - `get`, `update`, `modify`, and `delete` of a missing id fail with `NotFound`
/// - `list` returns records sorted by id
#[async_trait]
pub trait Repository<T: Record>: Send + Sync {
    /// All records, sorted by id.
    async fn list(&self) -> Result<Vec<T>>;

    /// Fetch one record.
    async fn get(&self, id: &str) -> Result<T>;

    /// Store a new record and return it as stored.
    async fn insert(&self, record: T) -> Result<T>;

    /// Replace the record `id` and return it as stored.
    async fn update(&self, id: &str, record: T) -> Result<T>;

    /// Apply `edit` to the record `id` and store the result.
    ///
    /// No other write to the collection runs between the read and the
    /// write. If `edit` fails nothing is stored.
    async fn modify<'a>(&'a self, id: &'a str, edit: Edit<'a, T>) -> Result<T>;

    /// Remove and return the record `id`.
    async fn delete(&self, id: &str) -> Result<T>;

    /// Number of records.
    async fn count(&self) -> Result<usize> {
        Ok(self.list().await?.len())
    }

    /// Backend name for diagnostics.
    fn name(&self) -> &str;
}

// ============================================================================
// Collection rules
// ============================================================================

pub(crate) fn fetch<T: Record>(records: &BTreeMap<String, T>, id: &str) -> Result<T> {
    records
        .get(id)
        .cloned()
        .ok_or_else(|| Error::not_found(T::KIND, id))
}

pub(crate) fn apply_insert<T: Record>(records: &mut BTreeMap<String, T>, mut record: T) -> Result<T> {
    prepare_insert(&mut record, Utc::now())?;
    if records.contains_key(record.id()) {
        return Err(Error::already_exists(T::KIND, record.id()));
    }
    records.insert(record.id().to_string(), record.clone());
    Ok(record)
}

pub(crate) fn apply_update<T: Record>(
    records: &mut BTreeMap<String, T>,
    id: &str,
    mut record: T,
) -> Result<T> {
    let existing = records
        .get(id)
        .ok_or_else(|| Error::not_found(T::KIND, id))?;
    prepare_replace(&mut record, existing, Utc::now())?;
    records.insert(id.to_string(), record.clone());
    Ok(record)
}

pub(crate) fn apply_modify<T: Record>(
    records: &mut BTreeMap<String, T>,
    id: &str,
    edit: Edit<'_, T>,
) -> Result<T> {
    let mut record = fetch(records, id)?;
    edit(&mut record)?;
    apply_update(records, id, record)
}

pub(crate) fn apply_delete<T: Record>(records: &mut BTreeMap<String, T>, id: &str) -> Result<T> {
    records
        .remove(id)
        .ok_or_else(|| Error::not_found(T::KIND, id))
}
