//! Upstream model providers.
//!
//! Two external capabilities back the pipeline: an image generation model
//! and a speech synthesis model. Each is reached through a small trait so
//! the pipeline can run against hosted APIs in production and in-process
//! mocks in tests and dry runs.

mod cloud_tts;
mod gemini;
mod mock;

pub use cloud_tts::{CLOUD_TTS_BASE_URL, CloudTtsClient, CloudTtsModel};
pub use gemini::{GEMINI_API_BASE_URL, GeminiClient, GeminiImageModel};
pub use mock::{MockImageModel, MockSpeechModel};

use async_trait::async_trait;

use crate::error::{GenerationError, SynthesisError};

/// An image payload returned by an image model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
    /// Content type of the bytes, e.g. `image/png`.
    pub mime_type: String,
}

/// An audio payload returned by a speech model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    /// Encoded audio bytes.
    pub bytes: Vec<u8>,
    /// Content type of the bytes, e.g. `audio/mpeg`.
    pub mime_type: String,
}

/// A named synthesis voice together with its language code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceProfile {
    /// BCP-47 language code, e.g. `fr-FR`.
    pub language_code: &'static str,
    /// Provider voice name.
    pub name: &'static str,
}

/// A model that produces one illustration per prompt.
#[async_trait]
pub trait ImageModel: Send + Sync {
    /// Identifier of the underlying model.
    fn model_id(&self) -> &str;

    /// Generate an illustration for the given prompt.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] if the upstream call fails or the
    /// response carries no usable image.
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, GenerationError>;
}

/// A model that narrates text with a given voice.
#[async_trait]
pub trait SpeechModel: Send + Sync {
    /// Identifier of the synthesis backend.
    fn name(&self) -> &str;

    /// Synthesize narration audio for the given text.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError`] if the upstream call fails or the
    /// response carries no usable audio.
    async fn synthesize(
        &self,
        text: &str,
        voice: VoiceProfile,
    ) -> Result<SynthesizedAudio, SynthesisError>;
}
