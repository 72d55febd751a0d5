//! Local filesystem `ObjectStore` - keys map to paths under a base directory.
//!
//! Grounded on the teacher's local document storage adapter: writes go
//! through a temp-file-then-rename so a crash mid-write never leaves a
//! partial blob visible at the final key, and directories are created
//! lazily as keys are written.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::ports::{ObjectStore, ObjectStoreError};

/// `ObjectStore` backed by the local filesystem, rooted at `base_path`.
///
/// Suitable for development and the integration tests under `tests/`
/// (paired with `tempfile::tempdir`); a production deployment could swap
/// this for an S3-backed implementation behind the same port.
pub struct LocalFileObjectStore {
    base_path: PathBuf,
}

impl LocalFileObjectStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into() }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ObjectStoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| ObjectStoreError::Io(e.to_string()))?;
    }
    let tmp_path = path.with_extension("tmp-write");
    let mut file = fs::File::create(&tmp_path)
        .await
        .map_err(|e| ObjectStoreError::Io(e.to_string()))?;
    file.write_all(bytes)
        .await
        .map_err(|e| ObjectStoreError::Io(e.to_string()))?;
    file.flush().await.map_err(|e| ObjectStoreError::Io(e.to_string()))?;
    fs::rename(&tmp_path, path)
        .await
        .map_err(|e| ObjectStoreError::Io(e.to_string()))?;
    Ok(())
}

#[async_trait]
impl ObjectStore for LocalFileObjectStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ObjectStoreError> {
        write_atomic(&self.resolve(key), bytes).await
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ObjectStoreError> {
        match fs::read(self.resolve(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ObjectStoreError::Io(e.to_string())),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
        Ok(fs::metadata(self.resolve(key)).await.is_ok())
    }

    async fn delete(&self, key: &str) -> Result<bool, ObjectStoreError> {
        match fs::remove_file(self.resolve(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ObjectStoreError::Io(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn put_then_get_round_trips_bytes() {
        let dir = tempdir().unwrap();
        let store = LocalFileObjectStore::new(dir.path());

        store.put("documents/d1/1/output.docx", b"hello").await.unwrap();
        let bytes = store.get("documents/d1/1/output.docx").await.unwrap();
        assert_eq!(bytes, Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn get_missing_key_returns_none() {
        let dir = tempdir().unwrap();
        let store = LocalFileObjectStore::new(dir.path());
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn exists_reflects_writes_and_deletes() {
        let dir = tempdir().unwrap();
        let store = LocalFileObjectStore::new(dir.path());

        assert!(!store.exists("k").await.unwrap());
        store.put("k", b"v").await.unwrap();
        assert!(store.exists("k").await.unwrap());
        assert!(store.delete("k").await.unwrap());
        assert!(!store.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn delete_missing_key_returns_false() {
        let dir = tempdir().unwrap();
        let store = LocalFileObjectStore::new(dir.path());
        assert!(!store.delete("nope").await.unwrap());
    }

    #[tokio::test]
    async fn put_creates_nested_directories() {
        let dir = tempdir().unwrap();
        let store = LocalFileObjectStore::new(dir.path());
        store.put("templates/t1/2/source.docx", b"bytes").await.unwrap();
        assert!(store.exists("templates/t1/2/source.docx").await.unwrap());
    }
}
