//! Trait seams for the external speech providers.
//!
//! The server holds these as trait objects so tests can substitute
//! in-process fakes for the subprocess-backed services.

use crate::error::VoiceError;
use async_trait::async_trait;

/// Speech-to-text. `format` is the container/codec label as received
/// from the client (e.g. `webm`); implementations treat the bytes as
/// opaque and may use the label only for provider hints.
#[async_trait]
pub trait SpeechTranscriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8], format: &str) -> Result<String, VoiceError>;
}

/// Text-to-speech.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, VoiceError>;

    /// MIME label for the bytes `synthesize` returns, carried on every
    /// audio event so clients never assume a fixed codec.
    fn audio_format(&self) -> &'static str;
}
