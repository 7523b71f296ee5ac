//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types and traits for easy access.
//!
//! # Usage
//!
//! ```rust,ignore
//! use wordcard::prelude::*;
//! ```

pub use crate::blob::{AUDIO_MPEG, BlobStore, FsStore, IMAGE_PNG, MemStore};
pub use crate::compose::{CaptionLayout, CaptionStyle, CardCompositor};
pub use crate::config::{
    ComposeConfig, Config, DatabaseConfig, GeminiConfig, StorageBackend, StorageConfig, TtsConfig,
};
pub use crate::error::{
    CompositionError, CompositionErrorKind, Error, GenerationError, GenerationErrorKind,
    PersistError, Result, StorageError, SynthesisError, SynthesisErrorKind,
};
pub use crate::generation::{
    BuildRequest, BuiltAssets, CreativeOutput, GenerationId, GenerationRecord, GenerationStatus,
    Language, MediaLocations, PedagogicalOutput, UserInput,
};
pub use crate::location::{AssetLocation, InvalidLocation};
pub use crate::media::{ImageGenerator, SpeechSynthesizer, voice_for};
pub use crate::pipeline::BuildPipeline;
pub use crate::providers::{
    CloudTtsModel, GeminiImageModel, GeneratedImage, ImageModel, MockImageModel, MockSpeechModel,
    SpeechModel, SynthesizedAudio, VoiceProfile,
};
pub use crate::store::{DEFAULT_HISTORY_LIMIT, GenerationStore};
