//! Configuration for the build pipeline.
//!
//! Configuration is explicit: it is loaded once at startup (TOML file plus
//! environment overrides) and handed by reference into component
//! constructors. Components never read ambient state themselves.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Image generation provider configuration.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Speech synthesis provider configuration.
    #[serde(default)]
    pub tts: TtsConfig,

    /// Media blob storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Result store database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Card composition configuration.
    #[serde(default)]
    pub compose: ComposeConfig,
}

/// Image generation provider config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key. Usually supplied via the `GEMINI_API_KEY` env var.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL of the generative language API.
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    /// Image model identifier.
    #[serde(default = "default_gemini_model")]
    pub model: String,
    /// Aspect ratio requested from the model.
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
    /// Output resolution class requested from the model.
    #[serde(default = "default_image_size")]
    pub image_size: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_gemini_base_url() -> String {
    crate::providers::GEMINI_API_BASE_URL.to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

fn default_aspect_ratio() -> String {
    "4:3".to_string()
}

fn default_image_size() -> String {
    "1K".to_string()
}

const fn default_timeout_secs() -> u64 {
    60
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_gemini_base_url(),
            model: default_gemini_model(),
            aspect_ratio: default_aspect_ratio(),
            image_size: default_image_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Speech synthesis provider config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    /// API key. Usually supplied via the `GOOGLE_TTS_API_KEY` env var.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL of the text-to-speech API.
    #[serde(default = "default_tts_base_url")]
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_tts_base_url() -> String {
    crate::providers::CLOUD_TTS_BASE_URL.to_string()
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_tts_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Media blob storage config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage backend to use.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Root directory for the filesystem backend.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Container name embedded in produced asset locations.
    #[serde(default = "default_container")]
    pub container: String,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("media")
}

fn default_container() -> String {
    "wordcard-media".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            root: default_storage_root(),
            container: default_container(),
        }
    }
}

/// Available blob storage backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Store media under a local directory tree.
    #[default]
    Fs,
    /// Keep media in process memory. Useful for tests and dry runs.
    Memory,
}

/// Result store database config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path. `:memory:` opens a transient database.
    #[serde(default = "default_database_path")]
    pub path: String,
}

fn default_database_path() -> String {
    "wordcard.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Card composition config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeConfig {
    /// Caption font file (TTF/OTF). When unset, well-known system font
    /// locations are tried.
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    /// Fraction of the image height covered by the caption band.
    #[serde(default = "default_band_ratio")]
    pub band_ratio: f32,
    /// Scrim opacity, 0 (transparent) to 255 (opaque).
    #[serde(default = "default_scrim_alpha")]
    pub scrim_alpha: u8,
    /// Font size as a fraction of the band height.
    #[serde(default = "default_font_scale")]
    pub font_scale: f32,
    /// Line height as a multiple of the font size.
    #[serde(default = "default_line_spacing")]
    pub line_spacing: f32,
}

const fn default_band_ratio() -> f32 {
    0.20
}

const fn default_scrim_alpha() -> u8 {
    160
}

const fn default_font_scale() -> f32 {
    0.40
}

const fn default_line_spacing() -> f32 {
    1.2
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            band_ratio: default_band_ratio(),
            scrim_alpha: default_scrim_alpha(),
            font_scale: default_font_scale(),
            line_spacing: default_line_spacing(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("reading {}: {e}", path.display())))?;
        toml::from_str(&raw).map_err(|e| Error::config(format!("parsing {}: {e}", path.display())))
    }

    /// Merge environment variables into the configuration.
    ///
    /// File values win; the environment only fills gaps.
    #[must_use]
    pub fn with_env(mut self) -> Self {
        if self.gemini.api_key.is_none()
            && let Ok(key) = std::env::var("GEMINI_API_KEY")
        {
            self.gemini.api_key = Some(key);
        }

        if self.tts.api_key.is_none()
            && let Ok(key) = std::env::var("GOOGLE_TTS_API_KEY")
        {
            self.tts.api_key = Some(key);
        }

        if self.compose.font_path.is_none()
            && let Ok(font) = std::env::var("WORDCARD_FONT_PATH")
        {
            self.compose.font_path = Some(PathBuf::from(font));
        }

        if let Ok(db) = std::env::var("WORDCARD_DATABASE") {
            self.database.path = db;
        }

        if let Ok(root) = std::env::var("WORDCARD_MEDIA_ROOT") {
            self.storage.root = PathBuf::from(root);
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_values() {
        let config = Config::default();
        assert_eq!(config.gemini.model, "gemini-2.5-flash-image");
        assert_eq!(config.gemini.aspect_ratio, "4:3");
        assert_eq!(config.gemini.image_size, "1K");
        assert_eq!(config.storage.backend, StorageBackend::Fs);
        assert_eq!(config.database.path, "wordcard.db");
        assert!((config.compose.band_ratio - 0.20).abs() < f32::EPSILON);
        assert_eq!(config.compose.scrim_alpha, 160);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.gemini.model, config.gemini.model);
        assert_eq!(parsed.storage.container, config.storage.container);
    }

    #[test]
    fn parse_sample_config() {
        let toml_str = r#"
[gemini]
api_key = "test-key"
model = "gemini-2.5-flash-image"

[storage]
backend = "memory"
container = "cards"

[compose]
font_path = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"
scrim_alpha = 128
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.gemini.api_key.as_deref(), Some("test-key"));
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.container, "cards");
        assert_eq!(config.compose.scrim_alpha, 128);
        assert!(config.compose.font_path.is_some());
        // Untouched sections keep their defaults.
        assert_eq!(config.tts.timeout_secs, 60);
    }

    #[test]
    fn unknown_top_level_keys_are_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str("[telemetry]\nurl = \"x\"");
        assert!(result.is_err());
    }
}
