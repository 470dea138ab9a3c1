//! Voice transcoding for Courier.
//!
//! Wraps the external speech providers behind two small traits:
//! [`SpeechTranscriber`] (audio → text) and [`SpeechSynthesizer`]
//! (text → audio bytes). The shipped implementations drive local
//! whisper.cpp and piper binaries over stdin/stdout; everything about
//! the audio itself is opaque to the rest of the system, which only
//! moves bytes and a format label.

pub mod adapter;
pub mod error;
pub mod stt;
pub mod tts;

pub use adapter::{SpeechSynthesizer, SpeechTranscriber};
pub use error::VoiceError;
pub use stt::SttService;
pub use tts::TtsService;
