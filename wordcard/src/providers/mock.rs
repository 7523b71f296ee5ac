//! Mock providers for testing and dry runs.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{GeneratedImage, ImageModel, SpeechModel, SynthesizedAudio, VoiceProfile};
use crate::error::{GenerationError, SynthesisError};

/// Encode a small solid-color PNG. 4:3, like the production model output.
fn solid_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(512, 384, image::Rgb([96, 148, 204]));
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, image::ImageFormat::Png)
        .expect("PNG encoding of an in-memory buffer");
    cursor.into_inner()
}

#[derive(Debug, Clone)]
enum ImagePayload {
    SolidPng,
    Bytes(Vec<u8>),
    Fail(GenerationError),
}

/// Mock image model producing deterministic output without network access.
///
/// The default payload is a small real PNG, so downstream decoding and
/// composition behave exactly as with provider output.
#[derive(Debug, Clone)]
pub struct MockImageModel {
    payload: ImagePayload,
    calls: Arc<AtomicUsize>,
}

impl MockImageModel {
    /// Create a mock returning a solid-color PNG.
    #[must_use]
    pub fn new() -> Self {
        Self {
            payload: ImagePayload::SolidPng,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock returning the given bytes verbatim.
    #[must_use]
    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self {
            payload: ImagePayload::Bytes(bytes),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock that fails every call with an API error.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            payload: ImagePayload::Fail(GenerationError::api("mock-image", 500, message)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `generate` calls made against this mock.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockImageModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ImageModel for MockImageModel {
    fn model_id(&self) -> &str {
        "mock-image"
    }

    async fn generate(
        &self,
        _prompt: &str,
    ) -> std::result::Result<GeneratedImage, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.payload {
            ImagePayload::SolidPng => Ok(GeneratedImage {
                bytes: solid_png(),
                mime_type: "image/png".to_string(),
            }),
            ImagePayload::Bytes(bytes) => Ok(GeneratedImage {
                bytes: bytes.clone(),
                mime_type: "image/png".to_string(),
            }),
            ImagePayload::Fail(err) => Err(err.clone()),
        }
    }
}

#[derive(Debug, Clone)]
enum AudioPayload {
    FramePrefixed,
    Fail(SynthesisError),
}

/// Mock speech model producing deterministic output without network access.
///
/// Records the voice of every call, so tests can assert which profile the
/// language mapping selected.
#[derive(Debug, Clone)]
pub struct MockSpeechModel {
    payload: AudioPayload,
    voices: Arc<Mutex<Vec<String>>>,
}

impl MockSpeechModel {
    /// Create a mock returning MP3-framed bytes derived from the text.
    #[must_use]
    pub fn new() -> Self {
        Self {
            payload: AudioPayload::FramePrefixed,
            voices: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that fails every call with an API error.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            payload: AudioPayload::Fail(SynthesisError::api("mock-voice", 500, message)),
            voices: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Voice names of all calls made against this mock, in order.
    #[must_use]
    pub fn voices(&self) -> Vec<String> {
        self.voices.lock().expect("voice log lock").clone()
    }
}

impl Default for MockSpeechModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SpeechModel for MockSpeechModel {
    fn name(&self) -> &str {
        "mock-speech"
    }

    async fn synthesize(
        &self,
        text: &str,
        voice: VoiceProfile,
    ) -> std::result::Result<SynthesizedAudio, SynthesisError> {
        self.voices
            .lock()
            .expect("voice log lock")
            .push(voice.name.to_string());
        match &self.payload {
            AudioPayload::FramePrefixed => {
                // MPEG frame sync followed by the text, enough to look like audio.
                let mut bytes = vec![0xff, 0xfb, 0x90, 0x00];
                bytes.extend_from_slice(text.as_bytes());
                Ok(SynthesizedAudio {
                    bytes,
                    mime_type: "audio/mpeg".to_string(),
                })
            }
            AudioPayload::Fail(err) => Err(err.clone()),
        }
    }
}
