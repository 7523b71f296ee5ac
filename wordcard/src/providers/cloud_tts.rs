//! Google Cloud Text-to-Speech API client.

use std::sync::Arc;

use base64::Engine as _;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use super::{SpeechModel, SynthesizedAudio, VoiceProfile};
use crate::config::TtsConfig;
use crate::error::{Error, Result, SynthesisError};

/// Default text-to-speech API base URL.
pub const CLOUD_TTS_BASE_URL: &str = "https://texttospeech.googleapis.com/v1";

/// Audio effects profile applied to every synthesis request.
const EFFECTS_PROFILE: &str = "headphone-class-device";

/// Cloud TTS API client.
///
/// Same shape as [`GeminiClient`](super::GeminiClient): an HTTP client plus
/// key and base URL, cheap to clone.
#[derive(Clone)]
pub struct CloudTtsClient {
    pub(crate) http_client: reqwest::Client,
    pub(crate) api_key: Arc<str>,
    pub(crate) base_url: Arc<str>,
}

impl std::fmt::Debug for CloudTtsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudTtsClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl CloudTtsClient {
    /// Create a new client with the given API key.
    ///
    /// Uses the default API base URL.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::builder().api_key(api_key).build()
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> CloudTtsClientBuilder {
        CloudTtsClientBuilder::default()
    }

    /// Create a speech model backed by this client.
    #[must_use]
    pub fn speech_model(&self) -> CloudTtsModel {
        CloudTtsModel::new(self.clone())
    }

    /// Get the base URL for API requests.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the authorization headers for API requests.
    pub(crate) fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&self.api_key).expect("Invalid API key format"),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }
}

/// Builder for [`CloudTtsClient`].
#[derive(Debug, Default)]
pub struct CloudTtsClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl CloudTtsClientBuilder {
    /// Set the API key.
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set a custom base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the request timeout in seconds.
    #[must_use]
    pub const fn timeout_secs(mut self, timeout: u64) -> Self {
        self.timeout_secs = Some(timeout);
        self
    }

    /// Build the client.
    ///
    /// # Panics
    ///
    /// Panics if the API key is not set.
    #[must_use]
    pub fn build(self) -> CloudTtsClient {
        let api_key = self.api_key.expect("API key is required");
        let base_url = self
            .base_url
            .unwrap_or_else(|| CLOUD_TTS_BASE_URL.to_string());

        let mut client_builder = reqwest::Client::builder();

        if let Some(timeout) = self.timeout_secs {
            client_builder = client_builder.timeout(std::time::Duration::from_secs(timeout));
        }

        let http_client = client_builder.build().expect("Failed to build HTTP client");

        CloudTtsClient {
            http_client,
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

/// Cloud TTS speech model.
///
/// Requests MP3 narration tuned for headphone playback and decodes the
/// base64 `audioContent` payload.
#[derive(Debug, Clone)]
pub struct CloudTtsModel {
    client: CloudTtsClient,
}

impl CloudTtsModel {
    /// Create a new speech model.
    pub(crate) const fn new(client: CloudTtsClient) -> Self {
        Self { client }
    }

    /// Create a model from the provider configuration section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no API key is configured.
    pub fn from_config(config: &TtsConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| Error::config("tts.api_key not set; set GOOGLE_TTS_API_KEY"))?;

        let client = CloudTtsClient::builder()
            .api_key(api_key)
            .base_url(config.base_url.clone())
            .timeout_secs(config.timeout_secs)
            .build();

        Ok(client.speech_model())
    }

    /// Build the request body for the API.
    fn build_request_body(text: &str, voice: VoiceProfile) -> Value {
        json!({
            "input": { "text": text },
            "voice": {
                "languageCode": voice.language_code,
                "name": voice.name,
            },
            "audioConfig": {
                "audioEncoding": "MP3",
                "effectsProfileId": [EFFECTS_PROFILE],
            },
        })
    }
}

#[async_trait::async_trait]
impl SpeechModel for CloudTtsModel {
    fn name(&self) -> &str {
        "cloud-tts"
    }

    #[instrument(skip(self, text), fields(voice = voice.name))]
    async fn synthesize(
        &self,
        text: &str,
        voice: VoiceProfile,
    ) -> std::result::Result<SynthesizedAudio, SynthesisError> {
        let body = Self::build_request_body(text, voice);

        debug!("Sending speech synthesis request");

        let response = self
            .client
            .http_client
            .post(format!("{}/text:synthesize", self.client.base_url))
            .headers(self.client.auth_headers())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SynthesisError::api(voice.name, status.as_u16(), error_text));
        }

        let parsed: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| SynthesisError::invalid_payload(format!("decoding response: {e}")))?;

        let audio_content = parsed
            .audio_content
            .ok_or_else(|| SynthesisError::no_payload(voice.name))?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(audio_content.as_bytes())
            .map_err(|e| SynthesisError::invalid_payload(format!("audio content: {e}")))?;

        Ok(SynthesizedAudio {
            bytes,
            mime_type: "audio/mpeg".to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CHARON_FR: VoiceProfile = VoiceProfile {
        language_code: "fr-FR",
        name: "fr-FR-Chirp3-HD-Charon",
    };

    mod client {
        use super::*;

        #[test]
        fn default_base_url() {
            let client = CloudTtsClient::new("test-key");
            assert_eq!(client.base_url(), CLOUD_TTS_BASE_URL);
        }

        #[test]
        fn debug_redacts_api_key() {
            let client = CloudTtsClient::new("very-secret");
            let rendered = format!("{client:?}");
            assert!(!rendered.contains("very-secret"));
        }

        #[test]
        fn from_config_requires_api_key() {
            let config = TtsConfig::default();
            assert!(CloudTtsModel::from_config(&config).is_err());
        }
    }

    mod requests {
        use super::*;

        #[test]
        fn body_requests_mp3_with_effects_profile() {
            let body = CloudTtsModel::build_request_body("Le chat dort.", CHARON_FR);
            assert_eq!(body["input"]["text"], "Le chat dort.");
            assert_eq!(body["voice"]["languageCode"], "fr-FR");
            assert_eq!(body["voice"]["name"], "fr-FR-Chirp3-HD-Charon");
            assert_eq!(body["audioConfig"]["audioEncoding"], "MP3");
            assert_eq!(
                body["audioConfig"]["effectsProfileId"][0],
                "headphone-class-device"
            );
        }
    }

    mod responses {
        use super::*;

        #[test]
        fn audio_content_parses_from_camel_case() {
            let parsed: SynthesizeResponse =
                serde_json::from_str(r#"{ "audioContent": "bXAz" }"#).unwrap();
            assert_eq!(parsed.audio_content.as_deref(), Some("bXAz"));
        }

        #[test]
        fn missing_audio_content_parses_as_none() {
            let parsed: SynthesizeResponse = serde_json::from_str("{}").unwrap();
            assert!(parsed.audio_content.is_none());
        }
    }
}
