//! Media blob storage.
//!
//! Generated media is written once and read back by path. [`BlobStore`]
//! abstracts over the backend; the filesystem store covers local runs and
//! the in-memory store covers tests and dry runs. Every successful upload
//! yields the [`AssetLocation`] under which the object can be fetched again.

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::MemStore;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::location::AssetLocation;

/// Content type of PNG images handed to [`BlobStore::put`].
pub const IMAGE_PNG: &str = "image/png";

/// Content type of MP3 audio handed to [`BlobStore::put`].
pub const AUDIO_MPEG: &str = "audio/mpeg";

/// Write-once object storage keyed by path.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Scheme this store stamps on produced locations.
    fn scheme(&self) -> &str;

    /// Container this store stamps on produced locations.
    fn container(&self) -> &str;

    /// Store an object and return its location.
    ///
    /// Existing objects at the same path are overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the object cannot be written.
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<AssetLocation, StorageError>;

    /// Fetch an object previously stored by this store.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if no object exists at the
    /// location, or [`StorageError::Backend`] if the location belongs to a
    /// different store.
    async fn get(&self, location: &AssetLocation) -> Result<Vec<u8>, StorageError>;
}

/// Checks that a location was produced by the given store.
fn check_ownership(
    location: &AssetLocation,
    scheme: &str,
    container: &str,
) -> Result<(), StorageError> {
    if location.scheme() != scheme || location.container() != container {
        return Err(StorageError::backend(format!(
            "location {location} does not belong to store {scheme}://{container}"
        )));
    }
    Ok(())
}
