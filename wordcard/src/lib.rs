//! Wordcard - a media build pipeline for children's language flashcards
//!
//! This crate turns a pedagogical brief into finished flashcard media: an
//! illustrated card with the sentence captioned over it plus a narration
//! clip, built concurrently and tracked in a SQLite record store.

pub mod blob;
pub mod compose;
pub mod config;
pub mod error;
pub mod generation;
pub mod location;
pub mod media;
pub mod pipeline;
pub mod prelude;
pub mod providers;
pub mod store;

pub use error::{
    CompositionError, Error, GenerationError, PersistError, Result, StorageError, SynthesisError,
};
