use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    /// Transcription failed. Terminal for the whole request: there is
    /// no partial transcript.
    #[error("transcription error: {0}")]
    Transcription(String),

    /// Synthesis failed. Non-fatal for the text channel; callers decide
    /// how to surface the lost audio block.
    #[error("synthesis error: {0}")]
    Synthesis(String),

    #[error("invalid voice configuration: {0}")]
    Config(String),
}
