//! File helpers shared by the JSON backends.

use std::path::Path;

use cornerstone_core::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Read and parse a JSON file. A missing file yields `None`.
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io_with_path(e, path)),
    }
}

/// Write `value` as pretty JSON: temp file in the same directory, then rename.
pub(crate) async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::io_with_path(e, parent))?;
    }

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &bytes)
        .await
        .map_err(|e| Error::io_with_path(e, &tmp))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(Error::io_with_path(e, path));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_read_missing_is_none() {
        let dir = tempfile::TempDir::new().unwrap();
        let value: Option<Value> = read_json(&dir.path().join("nope.json")).await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("doc.json");
        write_json_atomic(&path, &json!({"a": 1})).await.unwrap();
        let value: Option<Value> = read_json(&path).await.unwrap();
        assert_eq!(value, Some(json!({"a": 1})));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_read_invalid_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = read_json::<Value>(&path).await.unwrap_err();
        assert_eq!(err.category(), "serialization");
    }
}
