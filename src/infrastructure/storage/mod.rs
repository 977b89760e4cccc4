//! Filesystem helpers for the data directory

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use crate::application::errors::StorageError;

/// Make sure `dir` exists, creating it and any parents when missing.
///
/// Returns `true` when the directory was created. An existing directory is
/// left untouched; an existing non-directory is an error.
pub async fn ensure_dir(dir: impl AsRef<Path>) -> Result<bool, StorageError> {
    let dir = dir.as_ref();

    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => Ok(false),
        Ok(_) => Err(StorageError::NotADirectory(dir.display().to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tokio::fs::create_dir_all(dir).await?;
            tracing::info!("Created data directory {}", dir.display());
            Ok(true)
        }
        Err(e) => Err(e.into()),
    }
}

/// Read a JSON document, returning `None` when the file does not exist
pub async fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Option<T>, StorageError> {
    let path = path.as_ref();
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StorageError::Serialization(format!("{}: {}", path.display(), e)))
}

/// Write a JSON document through a temp file and rename
pub async fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), StorageError> {
    let path = path.as_ref();
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, content).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
