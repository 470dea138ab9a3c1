use crate::adapter::SpeechSynthesizer;
use crate::error::VoiceError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Maximum text input size (64 KiB). Prevents resource exhaustion from
/// oversized synthesis requests.
const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// Timeout for the synthesis process.
const TTS_TIMEOUT: Duration = Duration::from_secs(60);

/// Piper-backed speech synthesis.
///
/// Returns raw PCM audio (s16le, 22050 Hz with the default voices).
#[derive(Debug, Clone)]
pub struct TtsService {
    model_path: PathBuf,
    piper_binary: PathBuf,
    speed: f32,
}

impl TtsService {
    pub fn new(model_path: impl AsRef<Path>, piper_binary: impl AsRef<Path>) -> Self {
        Self {
            model_path: model_path.as_ref().to_path_buf(),
            piper_binary: piper_binary.as_ref().to_path_buf(),
            speed: 1.0,
        }
    }

    /// Playback speed multiplier. Must be within 0.1..=10.0.
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    async fn run(&self, text: &str) -> Result<Vec<u8>, VoiceError> {
        if text.is_empty() {
            return Err(VoiceError::Synthesis("empty text".to_string()));
        }
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(VoiceError::Synthesis(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_TTS_INPUT_BYTES
            )));
        }
        if !(0.1..=10.0).contains(&self.speed) {
            return Err(VoiceError::Config(
                "speed must be between 0.1 and 10.0".to_string(),
            ));
        }

        let mut command = Command::new(&self.piper_binary);
        command
            .arg("--model")
            .arg(&self.model_path)
            .arg("--output_raw")
            // Length scale is roughly the inverse of speed.
            .arg("--length_scale")
            .arg((1.0 / self.speed).to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|e| VoiceError::Synthesis(format!("failed to spawn piper: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| VoiceError::Synthesis("failed to open stdin".to_string()))?;
        let text_owned = text.to_string();

        // Write from a task so a full stdout pipe cannot deadlock us.
        let write_task =
            tokio::spawn(async move { stdin.write_all(text_owned.as_bytes()).await });

        let output = tokio::time::timeout(TTS_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                VoiceError::Synthesis(format!(
                    "TTS process timed out after {} seconds",
                    TTS_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| VoiceError::Synthesis(format!("failed to wait for piper: {e}")))?;

        match write_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(VoiceError::Synthesis(format!(
                    "failed to write to piper stdin: {e}"
                )))
            }
            Err(e) => return Err(VoiceError::Synthesis(format!("stdin task failed: {e}"))),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::Synthesis(format!("piper failed: {stderr}")));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl SpeechSynthesizer for TtsService {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, VoiceError> {
        tracing::debug!(chars = text.len(), "synthesizing speech");
        self.run(text).await
    }

    fn audio_format(&self) -> &'static str {
        "audio/pcm;rate=22050"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_text_is_rejected() {
        let service = TtsService::new("voice.onnx", "/nonexistent/piper");
        let err = service.synthesize("").await.unwrap_err();
        assert!(matches!(err, VoiceError::Synthesis(_)));
    }

    #[tokio::test]
    async fn oversized_text_is_rejected() {
        let service = TtsService::new("voice.onnx", "/nonexistent/piper");
        let text = "a".repeat(MAX_TTS_INPUT_BYTES + 1);
        let err = service.synthesize(&text).await.unwrap_err();
        assert!(err.to_string().contains("maximum size"));
    }

    #[tokio::test]
    async fn out_of_range_speed_is_a_config_error() {
        let service = TtsService::new("voice.onnx", "/nonexistent/piper").with_speed(0.0);
        let err = service.synthesize("hi").await.unwrap_err();
        assert!(matches!(err, VoiceError::Config(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn binary_stdout_becomes_audio_bytes() {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-piper");
        {
            let mut file = std::fs::File::create(&script).unwrap();
            writeln!(file, "#!/bin/sh\ncat > /dev/null\nprintf 'PCMPCM'").unwrap();
        }
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let service = TtsService::new("voice.onnx", &script);
        let audio = service.synthesize("say this").await.unwrap();
        assert_eq!(audio, b"PCMPCM");
        assert_eq!(service.audio_format(), "audio/pcm;rate=22050");
    }
}
