//! Narration synthesis.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::blob::BlobStore;
use crate::error::Result;
use crate::generation::{GenerationId, Language};
use crate::location::{AssetLocation, audio_path};
use crate::providers::{SpeechModel, VoiceProfile};

/// Chirp3 HD voices keyed by narration language.
const VOICE_TABLE: [(Language, VoiceProfile); 3] = [
    (
        Language::En,
        VoiceProfile {
            language_code: "en-US",
            name: "en-US-Chirp3-HD-Charon",
        },
    ),
    (
        Language::Fr,
        VoiceProfile {
            language_code: "fr-FR",
            name: "fr-FR-Chirp3-HD-Charon",
        },
    ),
    (
        Language::Es,
        VoiceProfile {
            language_code: "es-ES",
            name: "es-ES-Chirp3-HD-Charon",
        },
    ),
];

/// Look up the voice profile for a language.
///
/// Total over [`Language`]; the English voice doubles as the fallback.
#[must_use]
pub fn voice_for(language: Language) -> VoiceProfile {
    VOICE_TABLE
        .iter()
        .find(|(l, _)| *l == language)
        .map_or(VOICE_TABLE[0].1, |(_, voice)| *voice)
}

/// Synthesizes the narration for a generation and stores it.
///
/// The stored object lands at `audio/<id>.mp3`; repeated runs for the same
/// generation overwrite it.
#[derive(Clone)]
pub struct SpeechSynthesizer {
    model: Arc<dyn SpeechModel>,
    store: Arc<dyn BlobStore>,
}

impl fmt::Debug for SpeechSynthesizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechSynthesizer")
            .field("model", &self.model.name())
            .finish_non_exhaustive()
    }
}

impl SpeechSynthesizer {
    /// Create a synthesizer from a model and a blob store.
    pub fn new(model: Arc<dyn SpeechModel>, store: Arc<dyn BlobStore>) -> Self {
        Self { model, store }
    }

    /// Synthesize `text` in `language` and store the audio for `id`.
    ///
    /// # Errors
    ///
    /// Returns the synthesis error if the model call fails, or the storage
    /// error if the upload fails.
    #[instrument(skip(self, text), fields(id = %id, language = %language))]
    pub async fn synthesize(
        &self,
        id: &GenerationId,
        text: &str,
        language: Language,
    ) -> Result<AssetLocation> {
        let voice = voice_for(language);
        let audio = self.model.synthesize(text, voice).await?;
        debug!(bytes = audio.bytes.len(), voice = voice.name, "narration synthesized");

        let location = self
            .store
            .put(&audio_path(id), audio.bytes, &audio.mime_type)
            .await?;
        debug!(location = %location, "narration stored");
        Ok(location)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::blob::MemStore;
    use crate::error::Error;
    use crate::providers::MockSpeechModel;

    mod voice_table {
        use super::*;

        #[test]
        fn every_language_has_a_chirp3_voice() {
            assert_eq!(voice_for(Language::En).name, "en-US-Chirp3-HD-Charon");
            assert_eq!(voice_for(Language::Fr).name, "fr-FR-Chirp3-HD-Charon");
            assert_eq!(voice_for(Language::Es).name, "es-ES-Chirp3-HD-Charon");
        }

        #[test]
        fn language_codes_match_voices() {
            assert_eq!(voice_for(Language::Fr).language_code, "fr-FR");
            assert_eq!(voice_for(Language::Es).language_code, "es-ES");
        }

        #[test]
        fn unknown_input_codes_resolve_to_english_voice() {
            let voice = voice_for(Language::from_code("de"));
            assert_eq!(voice.name, "en-US-Chirp3-HD-Charon");
        }
    }

    mod synthesis {
        use super::*;

        #[tokio::test]
        async fn stores_narration_at_audio_path() {
            let store = Arc::new(MemStore::new("cards"));
            let model = Arc::new(MockSpeechModel::new());
            let synthesizer = SpeechSynthesizer::new(model.clone(), store.clone());

            let id = GenerationId::from("g1");
            let location = synthesizer
                .synthesize(&id, "La jirafa es alta.", Language::Es)
                .await
                .unwrap();

            assert_eq!(location.to_string(), "mem://cards/audio/g1.mp3");
            assert!(store.contains("audio/g1.mp3").unwrap());
            assert_eq!(model.voices(), vec!["es-ES-Chirp3-HD-Charon".to_string()]);
        }

        #[tokio::test]
        async fn model_failure_propagates_as_synthesis_error() {
            let synthesizer = SpeechSynthesizer::new(
                Arc::new(MockSpeechModel::failing("backend down")),
                Arc::new(MemStore::new("cards")),
            );

            let err = synthesizer
                .synthesize(&GenerationId::from("g1"), "text", Language::En)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Synthesis(_)));
        }
    }
}
