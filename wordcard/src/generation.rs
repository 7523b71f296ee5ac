//! Core domain types for a flashcard generation.
//!
//! A generation is one flashcard build: the learner profile and pedagogical
//! content captured up front, the creative brief, and the media locations
//! filled in once the build pipeline completes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::location::AssetLocation;

/// Unique identifier of a generation, also the key for its stored assets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationId(String);

impl GenerationId {
    /// Create a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for GenerationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for GenerationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for GenerationId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Narration language of a flashcard.
///
/// Unknown codes collapse to [`Language::En`] at the parsing edge, so every
/// language reaching the pipeline has a voice profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English.
    En,
    /// French.
    Fr,
    /// Spanish.
    Es,
}

impl Language {
    /// Parse a two-letter code, falling back to English for unknown input.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "fr" => Self::Fr,
            "es" => Self::Es,
            _ => Self::En,
        }
    }

    /// The two-letter code for this language.
    #[must_use]
    pub const fn as_code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
            Self::Es => "es",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::En
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Lifecycle status of a generation record.
///
/// Transitions are forward-only: `Initialized` may move to `Completed` or
/// `Failed`, terminal states never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    /// Record created, media build not yet finished.
    Initialized,
    /// All final media persisted.
    Completed,
    /// The caller layer recorded a build failure.
    Failed,
}

impl GenerationStatus {
    /// Stable string form used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parse the stable string form.
    #[must_use]
    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value {
            "initialized" => Some(Self::Initialized),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The learner profile and request captured at intake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    /// Learner age in years, when provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    /// Narration language.
    #[serde(default)]
    pub language: Language,
    /// Requested theme, e.g. "animals".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Specific word the card should teach.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_word: Option<String>,
}

/// Pedagogical content produced before the media build starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PedagogicalOutput {
    /// The sentence printed on the card and spoken aloud.
    pub sentence: String,
    /// What the card is meant to teach.
    pub learning_goal: String,
    /// Free-form content tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Creative brief for the illustration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreativeOutput {
    /// Prompt handed to the image model.
    pub image_prompt: String,
    /// Optional style notes accompanying the prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_description: Option<String>,
}

/// Media locations attached to a generation record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaLocations {
    /// Raw illustration before composition. Not written by the build
    /// pipeline; present for stores that track it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_image: Option<AssetLocation>,
    /// Final composed card image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_image: Option<AssetLocation>,
    /// Final narration audio.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_audio: Option<AssetLocation>,
}

/// A full generation record as held by the result store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRecord {
    /// Record identifier.
    pub id: GenerationId,
    /// Intake profile and request.
    pub user_input: UserInput,
    /// Pedagogical content.
    pub pedagogy: PedagogicalOutput,
    /// Creative brief, once recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creative: Option<CreativeOutput>,
    /// Attached media locations.
    #[serde(default)]
    pub media: MediaLocations,
    /// Lifecycle status.
    pub status: GenerationStatus,
    /// Failure description, set only by the caller layer on `Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Creation time of the record.
    pub created_at: DateTime<Utc>,
    /// Time the record reached a terminal status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Input to one run of the build pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Generation this build belongs to.
    pub id: GenerationId,
    /// Prompt for the illustration model.
    pub image_prompt: String,
    /// Sentence to print on the card and narrate.
    pub sentence: String,
    /// Narration language.
    pub language: Language,
}

/// Locations produced by a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltAssets {
    /// Generation the assets belong to.
    pub id: GenerationId,
    /// Composed card image.
    pub final_image: AssetLocation,
    /// Narration audio.
    pub final_audio: AssetLocation,
}

#[cfg(test)]
mod tests {
    use super::*;

    mod ids {
        use super::*;

        #[test]
        fn new_ids_are_unique() {
            assert_ne!(GenerationId::new(), GenerationId::new());
        }

        #[test]
        fn serializes_transparently() {
            let id = GenerationId::from("g1");
            assert_eq!(serde_json::to_string(&id).unwrap(), "\"g1\"");
        }
    }

    mod languages {
        use super::*;

        #[test]
        fn known_codes_parse() {
            assert_eq!(Language::from_code("en"), Language::En);
            assert_eq!(Language::from_code("fr"), Language::Fr);
            assert_eq!(Language::from_code("es"), Language::Es);
        }

        #[test]
        fn parsing_is_case_and_whitespace_tolerant() {
            assert_eq!(Language::from_code(" FR "), Language::Fr);
            assert_eq!(Language::from_code("Es"), Language::Es);
        }

        #[test]
        fn unknown_codes_fall_back_to_english() {
            assert_eq!(Language::from_code("de"), Language::En);
            assert_eq!(Language::from_code(""), Language::En);
            assert_eq!(Language::from_code("zz"), Language::En);
        }

        #[test]
        fn code_round_trip() {
            for language in [Language::En, Language::Fr, Language::Es] {
                assert_eq!(Language::from_code(language.as_code()), language);
            }
        }
    }

    mod statuses {
        use super::*;

        #[test]
        fn string_form_round_trips() {
            for status in [
                GenerationStatus::Initialized,
                GenerationStatus::Completed,
                GenerationStatus::Failed,
            ] {
                assert_eq!(GenerationStatus::from_str_opt(status.as_str()), Some(status));
            }
        }

        #[test]
        fn unknown_status_is_none() {
            assert_eq!(GenerationStatus::from_str_opt("pending"), None);
        }
    }

    mod documents {
        use super::*;

        #[test]
        fn user_input_uses_camel_case_keys() {
            let input = UserInput {
                age: Some(4),
                language: Language::Fr,
                theme: Some("animals".into()),
                target_word: Some("girafe".into()),
            };
            let json = serde_json::to_value(&input).unwrap();
            assert_eq!(json["targetWord"], "girafe");
            assert_eq!(json["language"], "fr");
        }

        #[test]
        fn pedagogy_defaults_tags_on_missing_key() {
            let parsed: PedagogicalOutput = serde_json::from_str(
                r#"{"sentence": "Le chat dort.", "learningGoal": "vocabulary: cat"}"#,
            )
            .unwrap();
            assert!(parsed.tags.is_empty());
        }
    }
}
