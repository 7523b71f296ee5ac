//! Gemini image generation API client.

use std::sync::Arc;

use base64::Engine as _;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use super::{GeneratedImage, ImageModel};
use crate::config::GeminiConfig;
use crate::error::{Error, GenerationError, Result};

/// Default generative language API base URL.
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Safety categories blocked at the lowest threshold.
///
/// Output is destined for young children; everything borderline is blocked.
const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_HARASSMENT",
];

/// Gemini API client for creating image models.
///
/// # Example
///
/// ```rust,ignore
/// use wordcard::providers::GeminiClient;
///
/// // With explicit API key
/// let client = GeminiClient::new("AIza...");
///
/// // With custom base URL (proxies, regional endpoints)
/// let client = GeminiClient::builder()
///     .api_key("AIza...")
///     .base_url("https://my-proxy.example/v1beta")
///     .build();
/// ```
#[derive(Clone)]
pub struct GeminiClient {
    pub(crate) http_client: reqwest::Client,
    pub(crate) api_key: Arc<str>,
    pub(crate) base_url: Arc<str>,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl GeminiClient {
    /// Create a new Gemini client with the given API key.
    ///
    /// Uses the default API base URL.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::builder().api_key(api_key).build()
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::default()
    }

    /// Create an image model with the specified model ID.
    #[must_use]
    pub fn image_model(&self, model_id: impl Into<String>) -> GeminiImageModel {
        GeminiImageModel::new(self.clone(), model_id)
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

/// Builder for [`GeminiClient`].
#[derive(Debug, Default)]
pub struct GeminiClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl GeminiClientBuilder {
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
    pub fn build(self) -> GeminiClient {
        let api_key = self.api_key.expect("API key is required");
        let base_url = self
            .base_url
            .unwrap_or_else(|| GEMINI_API_BASE_URL.to_string());

        let mut client_builder = reqwest::Client::builder();

        if let Some(timeout) = self.timeout_secs {
            client_builder = client_builder.timeout(std::time::Duration::from_secs(timeout));
        }

        let http_client = client_builder.build().expect("Failed to build HTTP client");

        GeminiClient {
            http_client,
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

/// Gemini image generation model.
///
/// Requests a single illustration per prompt via `generateContent` with the
/// `IMAGE` response modality and decodes the inline payload.
#[derive(Clone)]
pub struct GeminiImageModel {
    client: GeminiClient,
    model_id: String,
    aspect_ratio: String,
    image_size: String,
}

impl std::fmt::Debug for GeminiImageModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiImageModel")
            .field("model_id", &self.model_id)
            .field("aspect_ratio", &self.aspect_ratio)
            .field("image_size", &self.image_size)
            .finish()
    }
}

impl GeminiImageModel {
    /// Create a new image model.
    pub(crate) fn new(client: GeminiClient, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
            aspect_ratio: "4:3".to_string(),
            image_size: "1K".to_string(),
        }
    }

    /// Create a model from the provider configuration section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no API key is configured.
    pub fn from_config(config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| Error::config("gemini.api_key not set; set GEMINI_API_KEY"))?;

        let client = GeminiClient::builder()
            .api_key(api_key)
            .base_url(config.base_url.clone())
            .timeout_secs(config.timeout_secs)
            .build();

        Ok(client
            .image_model(config.model.clone())
            .with_aspect_ratio(config.aspect_ratio.clone())
            .with_image_size(config.image_size.clone()))
    }

    /// Set the aspect ratio requested from the model.
    #[must_use]
    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = aspect_ratio.into();
        self
    }

    /// Set the resolution class requested from the model.
    #[must_use]
    pub fn with_image_size(mut self, image_size: impl Into<String>) -> Self {
        self.image_size = image_size.into();
        self
    }

    /// Build the request body for the API.
    fn build_request_body(&self, prompt: &str) -> Value {
        let safety_settings: Vec<Value> = SAFETY_CATEGORIES
            .iter()
            .map(|category| {
                json!({
                    "category": category,
                    "threshold": "BLOCK_LOW_AND_ABOVE",
                })
            })
            .collect();

        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
            "generationConfig": {
                "responseModalities": ["IMAGE"],
                "imageConfig": {
                    "aspectRatio": self.aspect_ratio,
                    "imageSize": self.image_size,
                },
            },
            "safetySettings": safety_settings,
        })
    }

    /// Extract the first inline image payload from a parsed response.
    fn extract_image(
        &self,
        response: GenerateContentResponse,
    ) -> std::result::Result<GeneratedImage, GenerationError> {
        let inline = response
            .candidates
            .into_iter()
            .flatten()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts.unwrap_or_default())
            .find_map(|part| part.inline_data)
            .ok_or_else(|| GenerationError::no_payload(&self.model_id))?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(inline.data.as_bytes())
            .map_err(|e| GenerationError::invalid_payload(format!("inline data: {e}")))?;

        Ok(GeneratedImage {
            bytes,
            mime_type: inline.mime_type.unwrap_or_else(|| "image/png".to_string()),
        })
    }
}

#[async_trait::async_trait]
impl ImageModel for GeminiImageModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    #[instrument(skip(self, prompt), fields(model = %self.model_id))]
    async fn generate(
        &self,
        prompt: &str,
    ) -> std::result::Result<GeneratedImage, GenerationError> {
        let body = self.build_request_body(prompt);

        debug!("Sending image generation request");

        let response = self
            .client
            .http_client
            .post(format!(
                "{}/models/{}:generateContent",
                self.client.base_url, self.model_id
            ))
            .headers(self.client.auth_headers())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::api(
                &self.model_id,
                status.as_u16(),
                error_text,
            ));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::invalid_payload(format!("decoding response: {e}")))?;

        self.extract_image(parsed)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::GenerationErrorKind;

    fn model() -> GeminiImageModel {
        GeminiClient::builder()
            .api_key("test-key")
            .build()
            .image_model("gemini-2.5-flash-image")
    }

    mod client {
        use super::*;

        #[test]
        fn builder_overrides_base_url() {
            let client = GeminiClient::builder()
                .api_key("test-key")
                .base_url("https://proxy.example/v1beta")
                .timeout_secs(30)
                .build();
            assert_eq!(client.base_url(), "https://proxy.example/v1beta");
        }

        #[test]
        fn default_base_url() {
            let client = GeminiClient::new("test-key");
            assert_eq!(client.base_url(), GEMINI_API_BASE_URL);
        }

        #[test]
        fn debug_redacts_api_key() {
            let client = GeminiClient::new("very-secret");
            let rendered = format!("{client:?}");
            assert!(!rendered.contains("very-secret"));
            assert!(rendered.contains("REDACTED"));
        }

        #[test]
        fn from_config_requires_api_key() {
            let config = GeminiConfig::default();
            assert!(GeminiImageModel::from_config(&config).is_err());
        }
    }

    mod requests {
        use super::*;

        #[test]
        fn body_carries_modality_and_image_config() {
            let body = model().build_request_body("a friendly giraffe");
            assert_eq!(body["generationConfig"]["responseModalities"][0], "IMAGE");
            assert_eq!(body["generationConfig"]["imageConfig"]["aspectRatio"], "4:3");
            assert_eq!(body["generationConfig"]["imageConfig"]["imageSize"], "1K");
            assert_eq!(body["contents"][0]["parts"][0]["text"], "a friendly giraffe");
        }

        #[test]
        fn body_blocks_all_safety_categories() {
            let body = model().build_request_body("p");
            let settings = body["safetySettings"].as_array().unwrap();
            assert_eq!(settings.len(), SAFETY_CATEGORIES.len());
            for setting in settings {
                assert_eq!(setting["threshold"], "BLOCK_LOW_AND_ABOVE");
            }
        }
    }

    mod responses {
        use super::*;

        #[test]
        fn extracts_inline_payload() {
            let parsed: GenerateContentResponse = serde_json::from_value(serde_json::json!({
                "candidates": [{
                    "content": {
                        "parts": [
                            { "text": "here is your image" },
                            { "inlineData": { "mimeType": "image/png", "data": "aGVsbG8=" } }
                        ]
                    }
                }]
            }))
            .unwrap();

            let image = model().extract_image(parsed).unwrap();
            assert_eq!(image.bytes, b"hello");
            assert_eq!(image.mime_type, "image/png");
        }

        #[test]
        fn missing_payload_maps_to_no_payload_kind() {
            let parsed: GenerateContentResponse = serde_json::from_value(serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": "refused" }] } }]
            }))
            .unwrap();

            let err = model().extract_image(parsed).unwrap_err();
            assert_eq!(err.kind, GenerationErrorKind::NoPayload);
        }

        #[test]
        fn bad_base64_maps_to_invalid_payload_kind() {
            let parsed: GenerateContentResponse = serde_json::from_value(serde_json::json!({
                "candidates": [{
                    "content": { "parts": [{ "inlineData": { "data": "!!not-base64!!" } }] }
                }]
            }))
            .unwrap();

            let err = model().extract_image(parsed).unwrap_err();
            assert_eq!(err.kind, GenerationErrorKind::InvalidPayload);
        }

        #[test]
        fn empty_response_maps_to_no_payload_kind() {
            let parsed: GenerateContentResponse =
                serde_json::from_value(serde_json::json!({})).unwrap();
            let err = model().extract_image(parsed).unwrap_err();
            assert_eq!(err.kind, GenerationErrorKind::NoPayload);
        }
    }
}
