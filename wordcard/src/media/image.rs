//! Raw illustration generation.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::blob::BlobStore;
use crate::error::Result;
use crate::generation::GenerationId;
use crate::location::{AssetLocation, raw_image_path};
use crate::providers::ImageModel;

/// Generates the raw illustration for a generation and stores it.
///
/// The stored object lands at `raw/<id>.png`; repeated runs for the same
/// generation overwrite it.
#[derive(Clone)]
pub struct ImageGenerator {
    model: Arc<dyn ImageModel>,
    store: Arc<dyn BlobStore>,
}

impl fmt::Debug for ImageGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageGenerator")
            .field("model", &self.model.model_id())
            .finish_non_exhaustive()
    }
}

impl ImageGenerator {
    /// Create a generator from a model and a blob store.
    pub fn new(model: Arc<dyn ImageModel>, store: Arc<dyn BlobStore>) -> Self {
        Self { model, store }
    }

    /// Generate the illustration for `prompt` and store it for `id`.
    ///
    /// # Errors
    ///
    /// Returns the generation error if the model call fails, or the storage
    /// error if the upload fails.
    #[instrument(skip(self, prompt), fields(id = %id, model = self.model.model_id()))]
    pub async fn generate(&self, id: &GenerationId, prompt: &str) -> Result<AssetLocation> {
        let image = self.model.generate(prompt).await?;
        debug!(bytes = image.bytes.len(), mime = %image.mime_type, "illustration generated");

        let location = self
            .store
            .put(&raw_image_path(id), image.bytes, &image.mime_type)
            .await?;
        debug!(location = %location, "raw illustration stored");
        Ok(location)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::blob::MemStore;
    use crate::error::{Error, StorageError};
    use crate::providers::MockImageModel;

    /// Blob store that refuses every write.
    #[derive(Debug)]
    struct FailStore;

    #[async_trait::async_trait]
    impl BlobStore for FailStore {
        fn scheme(&self) -> &str {
            "mem"
        }

        fn container(&self) -> &str {
            "broken"
        }

        async fn put(
            &self,
            _path: &str,
            _bytes: Vec<u8>,
            _content_type: &str,
        ) -> std::result::Result<AssetLocation, StorageError> {
            Err(StorageError::backend("disk full"))
        }

        async fn get(
            &self,
            location: &AssetLocation,
        ) -> std::result::Result<Vec<u8>, StorageError> {
            Err(StorageError::NotFound(location.to_string()))
        }
    }

    #[tokio::test]
    async fn stores_illustration_at_raw_path() {
        let store = Arc::new(MemStore::new("cards"));
        let generator = ImageGenerator::new(Arc::new(MockImageModel::new()), store.clone());

        let id = GenerationId::from("g1");
        let location = generator.generate(&id, "a friendly giraffe").await.unwrap();

        assert_eq!(location.to_string(), "mem://cards/raw/g1.png");
        assert!(store.contains("raw/g1.png").unwrap());
    }

    #[tokio::test]
    async fn model_failure_propagates_as_generation_error() {
        let generator = ImageGenerator::new(
            Arc::new(MockImageModel::failing("quota exceeded")),
            Arc::new(MemStore::new("cards")),
        );

        let err = generator
            .generate(&GenerationId::from("g1"), "p")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }

    #[tokio::test]
    async fn storage_failure_propagates_as_storage_error() {
        let generator = ImageGenerator::new(Arc::new(MockImageModel::new()), Arc::new(FailStore));

        let err = generator
            .generate(&GenerationId::from("g1"), "p")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
