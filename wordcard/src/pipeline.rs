//! Flashcard build orchestration.
//!
//! [`BuildPipeline`] runs the media build for one generation: the image
//! branch (generate, then compose) and the speech branch run concurrently
//! and are joined before anything touches the record store. The record is
//! completed only when both branches succeed; on a branch failure the
//! record is left untouched for the caller to resolve.

use tokio::try_join;
use tracing::{info, instrument, warn};

use crate::compose::CardCompositor;
use crate::error::Result;
use crate::generation::{BuildRequest, BuiltAssets};
use crate::media::{ImageGenerator, SpeechSynthesizer};
use crate::store::GenerationStore;

/// Orchestrates one flashcard media build end to end.
#[derive(Debug, Clone)]
pub struct BuildPipeline {
    images: ImageGenerator,
    speech: SpeechSynthesizer,
    compositor: CardCompositor,
    store: GenerationStore,
}

impl BuildPipeline {
    /// Assemble a pipeline from its stages.
    pub fn new(
        images: ImageGenerator,
        speech: SpeechSynthesizer,
        compositor: CardCompositor,
        store: GenerationStore,
    ) -> Self {
        Self {
            images,
            speech,
            compositor,
            store,
        }
    }

    /// Build the media for `request` and complete its record.
    ///
    /// The image branch generates the raw illustration and composes the
    /// captioned card; the speech branch narrates the sentence. Both run
    /// concurrently. The first branch error aborts the build: the record
    /// stays in its initialized state and any blob the surviving branch
    /// already stored is left behind.
    ///
    /// # Errors
    ///
    /// Returns the failing branch's error, or a persistence error when the
    /// record cannot be completed.
    #[instrument(skip_all, fields(id = %request.id, language = %request.language))]
    pub async fn build(&self, request: &BuildRequest) -> Result<BuiltAssets> {
        let image_branch = async {
            let raw = self
                .images
                .generate(&request.id, &request.image_prompt)
                .await?;
            self.compositor
                .compose(&request.id, &raw, &request.sentence)
                .await
        };
        let speech_branch =
            self.speech
                .synthesize(&request.id, &request.sentence, request.language);

        let (final_image, final_audio) =
            try_join!(image_branch, speech_branch).map_err(|err| {
                warn!(error = %err, "media branch failed; stored sibling assets are orphaned");
                err
            })?;

        self.store
            .persist_final(&request.id, &final_image, &final_audio)
            .await?;
        info!(image = %final_image, audio = %final_audio, "flashcard build complete");

        Ok(BuiltAssets {
            id: request.id.clone(),
            final_image,
            final_audio,
        })
    }
}
