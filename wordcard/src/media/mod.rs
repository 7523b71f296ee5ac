//! Media generation components.
//!
//! The two leaves of the build pipeline: [`ImageGenerator`] turns a prompt
//! into a stored raw illustration, [`SpeechSynthesizer`] turns a sentence
//! into stored narration audio. Both call a provider model and write the
//! result under the deterministic object path for the generation.

mod image;
mod speech;

pub use image::ImageGenerator;
pub use speech::{SpeechSynthesizer, voice_for};
