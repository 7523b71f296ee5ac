//! In-memory blob store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{BlobStore, check_ownership};
use crate::error::StorageError;
use crate::location::AssetLocation;

/// Scheme stamped on locations produced by [`MemStore`].
pub const MEM_SCHEME: &str = "mem";

/// Blob store keeping objects in process memory.
///
/// Cloneable; clones share the same object map. Contents are lost on drop,
/// which is the point: tests and `--mock` runs get real storage semantics
/// without touching disk.
#[derive(Debug, Clone)]
pub struct MemStore {
    container: String,
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemStore {
    /// Create an empty store with the given container name.
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            objects: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of stored objects.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] if the object map lock is poisoned.
    pub fn object_count(&self) -> Result<usize, StorageError> {
        Ok(self
            .objects
            .lock()
            .map_err(|e| StorageError::backend(e.to_string()))?
            .len())
    }

    /// Whether an object exists at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] if the object map lock is poisoned.
    pub fn contains(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self
            .objects
            .lock()
            .map_err(|e| StorageError::backend(e.to_string()))?
            .contains_key(path))
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new("wordcard-media")
    }
}

#[async_trait]
impl BlobStore for MemStore {
    fn scheme(&self) -> &str {
        MEM_SCHEME
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
        self.objects
            .lock()
            .map_err(|e| StorageError::backend(e.to_string()))?
            .insert(path.to_owned(), bytes);
        AssetLocation::new(MEM_SCHEME, &self.container, path)
            .map_err(|e| StorageError::backend(e.to_string()))
    }

    async fn get(&self, location: &AssetLocation) -> Result<Vec<u8>, StorageError> {
        check_ownership(location, MEM_SCHEME, &self.container)?;
        self.objects
            .lock()
            .map_err(|e| StorageError::backend(e.to_string()))?
            .get(location.path())
            .cloned()
            .ok_or_else(|| StorageError::NotFound(location.to_string()))
    }
}
