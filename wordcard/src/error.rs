//! Unified error types for the wordcard pipeline.
//!
//! This module provides the failure taxonomy for the build pipeline:
//! - Provider errors (image generation, speech synthesis)
//! - Card composition errors
//! - Record persistence and blob storage errors

use std::fmt;

/// Result type alias for wordcard operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the wordcard pipeline.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Image generation error.
    #[error("image generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Speech synthesis error.
    #[error("speech synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    /// Card composition error.
    #[error("card composition error: {0}")]
    Composition(#[from] CompositionError),

    /// Generation record persistence error.
    #[error("persistence error: {0}")]
    Persist(#[from] PersistError),

    /// Blob storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Error type for image generation provider calls.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct GenerationError {
    /// The error kind.
    pub kind: GenerationErrorKind,
    /// The model identifier the call was made against, when known.
    pub model: Option<String>,
    /// Additional error message.
    pub message: String,
}

/// Categories of image generation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum GenerationErrorKind {
    /// Upstream API returned a non-success status.
    Api,
    /// Response parsed but carried no image payload.
    NoPayload,
    /// Response body could not be decoded.
    InvalidPayload,
    /// Network or connection error, including timeouts.
    Network,
}

impl GenerationError {
    /// Create an API status error.
    #[must_use]
    pub fn api(model: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self {
            kind: GenerationErrorKind::Api,
            model: Some(model.into()),
            message: format!("HTTP {status}: {}", body.into()),
        }
    }

    /// Create a missing payload error.
    #[must_use]
    pub fn no_payload(model: impl Into<String>) -> Self {
        Self {
            kind: GenerationErrorKind::NoPayload,
            model: Some(model.into()),
            message: "response contained no inline image data".into(),
        }
    }

    /// Create an invalid payload error.
    #[must_use]
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self {
            kind: GenerationErrorKind::InvalidPayload,
            model: None,
            message: message.into(),
        }
    }

    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: GenerationErrorKind::Network,
            model: None,
            message: message.into(),
        }
    }

    /// Check if this is a retryable error.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind, GenerationErrorKind::Network)
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(model) = &self.model {
            write!(f, "[{model}] ")?;
        }
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for GenerationError {}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network("request timed out")
        } else if err.is_connect() {
            Self::network(format!("connection failed: {err}"))
        } else {
            Self::network(err.to_string())
        }
    }
}

/// Error type for speech synthesis provider calls.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct SynthesisError {
    /// The error kind.
    pub kind: SynthesisErrorKind,
    /// The voice the call was made with, when known.
    pub voice: Option<String>,
    /// Additional error message.
    pub message: String,
}

/// Categories of speech synthesis errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SynthesisErrorKind {
    /// Upstream API returned a non-success status.
    Api,
    /// Response parsed but carried no audio payload.
    NoPayload,
    /// Response body could not be decoded.
    InvalidPayload,
    /// Network or connection error, including timeouts.
    Network,
}

impl SynthesisError {
    /// Create an API status error.
    #[must_use]
    pub fn api(voice: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self {
            kind: SynthesisErrorKind::Api,
            voice: Some(voice.into()),
            message: format!("HTTP {status}: {}", body.into()),
        }
    }

    /// Create a missing payload error.
    #[must_use]
    pub fn no_payload(voice: impl Into<String>) -> Self {
        Self {
            kind: SynthesisErrorKind::NoPayload,
            voice: Some(voice.into()),
            message: "response contained no audio content".into(),
        }
    }

    /// Create an invalid payload error.
    #[must_use]
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self {
            kind: SynthesisErrorKind::InvalidPayload,
            voice: None,
            message: message.into(),
        }
    }

    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: SynthesisErrorKind::Network,
            voice: None,
            message: message.into(),
        }
    }

    /// Check if this is a retryable error.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind, SynthesisErrorKind::Network)
    }
}

impl fmt::Display for SynthesisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(voice) = &self.voice {
            write!(f, "[{voice}] ")?;
        }
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SynthesisError {}

impl From<reqwest::Error> for SynthesisError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network("request timed out")
        } else if err.is_connect() {
            Self::network(format!("connection failed: {err}"))
        } else {
            Self::network(err.to_string())
        }
    }
}

/// Error type for card composition failures.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct CompositionError {
    /// The error kind.
    pub kind: CompositionErrorKind,
    /// Additional error message.
    pub message: String,
}

/// Categories of card composition errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompositionErrorKind {
    /// Input location was malformed or used an unsupported scheme.
    InvalidLocation,
    /// The raw image could not be fetched from storage.
    Fetch,
    /// The raw image bytes could not be decoded.
    Decode,
    /// The caption could not be rendered onto the image.
    Render,
    /// The composed image could not be encoded.
    Encode,
}

impl CompositionError {
    /// Create an invalid location error.
    #[must_use]
    pub fn invalid_location(message: impl Into<String>) -> Self {
        Self {
            kind: CompositionErrorKind::InvalidLocation,
            message: message.into(),
        }
    }

    /// Create a fetch error.
    #[must_use]
    pub fn fetch(message: impl Into<String>) -> Self {
        Self {
            kind: CompositionErrorKind::Fetch,
            message: message.into(),
        }
    }

    /// Create a decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: CompositionErrorKind::Decode,
            message: message.into(),
        }
    }

    /// Create a render error.
    #[must_use]
    pub fn render(message: impl Into<String>) -> Self {
        Self {
            kind: CompositionErrorKind::Render,
            message: message.into(),
        }
    }

    /// Create an encode error.
    #[must_use]
    pub fn encode(message: impl Into<String>) -> Self {
        Self {
            kind: CompositionErrorKind::Encode,
            message: message.into(),
        }
    }
}

impl fmt::Display for CompositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            CompositionErrorKind::InvalidLocation => "invalid location",
            CompositionErrorKind::Fetch => "fetch",
            CompositionErrorKind::Decode => "decode",
            CompositionErrorKind::Render => "render",
            CompositionErrorKind::Encode => "encode",
        };
        write!(f, "{kind}: {}", self.message)
    }
}

impl std::error::Error for CompositionError {}

/// Error type for generation record persistence.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum PersistError {
    /// No record exists for the given identifier.
    #[error("generation record not found: {0}")]
    NotFound(String),

    /// The requested status transition conflicts with the stored record.
    #[error("conflicting record update: {0}")]
    Conflict(String),

    /// Underlying database error.
    #[error("database error: {0}")]
    Database(String),

    /// The connection lock was poisoned.
    #[error("connection lock poisoned: {0}")]
    Lock(String),

    /// The blocking database task failed to complete.
    #[error("database task failed: {0}")]
    Task(String),
}

impl From<rusqlite::Error> for PersistError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(err: serde_json::Error) -> Self {
        Self::Database(format!("column encoding: {err}"))
    }
}

/// Error type for blob storage operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageError {
    /// No object exists at the given location.
    #[error("object not found: {0}")]
    NotFound(String),

    /// I/O error from the storage backend.
    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific error.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Create a backend error with a message.
    #[must_use]
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}
