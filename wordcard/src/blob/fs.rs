//! Filesystem-backed blob store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{BlobStore, check_ownership};
use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::location::AssetLocation;

/// Scheme stamped on locations produced by [`FsStore`].
pub const FS_SCHEME: &str = "file";

/// Blob store writing objects under a local directory tree.
///
/// Object paths map directly to paths below the root directory; parent
/// directories are created on demand.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
    container: String,
}

impl FsStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, container: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            container: container.into(),
        }
    }

    /// Create a store from the storage configuration section.
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.root.clone(), config.container.clone())
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, path: &str) -> Result<PathBuf, StorageError> {
        // Object paths are internal, but never follow one out of the root.
        if path.split('/').any(|seg| seg == "..") {
            return Err(StorageError::backend(format!(
                "object path escapes store root: {path}"
            )));
        }
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl BlobStore for FsStore {
    fn scheme(&self) -> &str {
        FS_SCHEME
    }

    fn container(&self) -> &str {
        &self.container
    }

    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<AssetLocation, StorageError> {
        let full = self.object_path(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, &bytes).await?;
        AssetLocation::new(FS_SCHEME, &self.container, path)
            .map_err(|e| StorageError::backend(e.to_string()))
    }

    async fn get(&self, location: &AssetLocation) -> Result<Vec<u8>, StorageError> {
        check_ownership(location, FS_SCHEME, &self.container)?;
        let full = self.object_path(location.path())?;
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(location.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use assert_fs::TempDir;

    fn store(dir: &TempDir) -> FsStore {
        FsStore::new(dir.path(), "cards")
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let location = store
            .put("raw/g1.png", b"png-bytes".to_vec(), super::super::IMAGE_PNG)
            .await
            .unwrap();
        assert_eq!(location.to_string(), "file://cards/raw/g1.png");

        let bytes = store.get(&location).await.unwrap();
        assert_eq!(bytes, b"png-bytes");
    }

    #[tokio::test]
    async fn put_creates_nested_directories() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        store
            .put("audio/some/deep/g1.mp3", vec![1, 2, 3], "audio/mpeg")
            .await
            .unwrap();
        assert!(dir.path().join("audio/some/deep/g1.mp3").exists());
    }

    #[tokio::test]
    async fn get_missing_object_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let location = AssetLocation::new("file", "cards", "raw/missing.png").unwrap();
        let err = store.get(&location).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn get_rejects_foreign_location() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let foreign = AssetLocation::new("gs", "cards", "raw/g1.png").unwrap();
        let err = store.get(&foreign).await.unwrap_err();
        assert!(matches!(err, StorageError::Backend(_)));
    }

    #[tokio::test]
    async fn rejects_path_escaping_root() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let err = store
            .put("../outside.png", vec![0], "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Backend(_)));
    }
}
