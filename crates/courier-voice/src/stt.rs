use crate::adapter::SpeechTranscriber;
use crate::error::VoiceError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Maximum audio input size (10 MiB). Prevents OOM from oversized payloads.
const MAX_AUDIO_INPUT_BYTES: usize = 10 * 1024 * 1024;

/// Timeout for the transcription process.
const STT_TIMEOUT: Duration = Duration::from_secs(120);

/// Whisper.cpp-backed transcription.
///
/// Pipes the audio into the binary's stdin and reads the transcript
/// from stdout. A malformed or unsupported recording surfaces as a
/// non-zero exit, which maps to [`VoiceError::Transcription`].
#[derive(Debug, Clone)]
pub struct SttService {
    model_path: PathBuf,
    binary_path: PathBuf,
}

impl SttService {
    pub fn new(model_path: impl Into<PathBuf>, binary_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            binary_path: binary_path.into(),
        }
    }

    async fn run(&self, audio: &[u8]) -> Result<String, VoiceError> {
        if audio.is_empty() {
            return Err(VoiceError::Transcription("empty audio payload".to_string()));
        }
        if audio.len() > MAX_AUDIO_INPUT_BYTES {
            return Err(VoiceError::Transcription(format!(
                "audio exceeds maximum size: {} bytes (limit: {} bytes)",
                audio.len(),
                MAX_AUDIO_INPUT_BYTES
            )));
        }

        let mut command = Command::new(&self.binary_path);
        command
            .arg("-m")
            .arg(&self.model_path)
            .arg("-f")
            .arg("-") // read from stdin
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|e| VoiceError::Transcription(format!("failed to spawn STT binary: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| VoiceError::Transcription("failed to open stdin".to_string()))?;
        stdin
            .write_all(audio)
            .await
            .map_err(|e| VoiceError::Transcription(format!("failed to write audio: {e}")))?;
        drop(stdin); // EOF

        let output = tokio::time::timeout(STT_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                VoiceError::Transcription(format!(
                    "STT process timed out after {} seconds",
                    STT_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| VoiceError::Transcription(format!("failed to read output: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::Transcription(format!(
                "STT binary failed: {stderr}"
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl SpeechTranscriber for SttService {
    async fn transcribe(&self, audio: &[u8], format: &str) -> Result<String, VoiceError> {
        tracing::debug!(bytes = audio.len(), format, "transcribing audio");
        self.run(audio).await
    }
}
