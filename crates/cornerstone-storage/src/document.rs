//! Single-document store, used for the tenant settings.

use std::path::{Path, PathBuf};

use cornerstone_core::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use crate::fs::{read_json, write_json_atomic};

/// One JSON document, cached in memory and optionally persisted.
///
/// A missing file reads as `T::default()`. Updates follow the same
/// copy-persist-publish order as [`JsonFileRepository`](crate::JsonFileRepository).
pub struct DocumentStore<T> {
    path: Option<PathBuf>,
    value: RwLock<T>,
}

impl<T> DocumentStore<T>
where
    T: Serialize + DeserializeOwned + Default + Clone + Send + Sync,
{
    /// Open `<data_dir>/<name>.json`.
    pub async fn open(data_dir: impl AsRef<Path>, name: &str) -> Result<Self> {
        let path = data_dir.as_ref().join(format!("{name}.json"));
        let value = match read_json(&path).await? {
            Some(value) => value,
            None => {
                log::info!("No {} found, starting from defaults", path.display());
                T::default()
            }
        };
        Ok(Self {
            path: Some(path),
            value: RwLock::new(value),
        })
    }

    /// A store that never touches the disk.
    pub fn in_memory(value: T) -> Self {
        Self {
            path: None,
            value: RwLock::new(value),
        }
    }

    /// Backing file, if persisted.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Current value.
    pub async fn get(&self) -> T {
        self.value.read().await.clone()
    }

    /// Modify the document with `f` and persist the result.
    ///
    /// When `f` or the write fails, the stored document is unchanged.
    pub async fn update<F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut T) -> Result<()> + Send,
    {
        let mut guard = self.value.write().await;
        let mut next = guard.clone();
        f(&mut next)?;
        if let Some(path) = &self.path {
            write_json_atomic(path, &next).await?;
        }
        *guard = next.clone();
        Ok(next)
    }

    /// Replace the whole document.
    pub async fn replace(&self, value: T) -> Result<T> {
        self.update(|current| {
            *current = value;
            Ok(())
        })
        .await
    }
}
