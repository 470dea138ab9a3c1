//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Model provider settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Speech service settings.
    #[serde(default)]
    pub voice: VoiceConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// LLM provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// API key for the provider. Usually supplied via `COURIER_API_KEY`
    /// rather than the config file.
    #[serde(default)]
    pub api_key: String,

    /// Model name passed to the provider.
    #[serde(default = "default_model_name")]
    pub name: String,

    /// Chat-completions endpoint override (proxies, test servers).
    #[serde(default)]
    pub api_url: Option<String>,

    /// Artificial latency of the canned email tools, in milliseconds.
    #[serde(default = "default_tool_latency_ms")]
    pub tool_latency_ms: u64,
}

/// Paths and parameters of the speech subprocesses.
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    /// Path to the whisper.cpp transcription model.
    #[serde(default = "default_stt_model")]
    pub stt_model: String,

    /// Path to the whisper.cpp binary.
    #[serde(default = "default_stt_binary")]
    pub stt_binary: String,

    /// Path to the piper voice model.
    #[serde(default = "default_tts_model")]
    pub tts_model: String,

    /// Path to the piper binary.
    #[serde(default = "default_tts_binary")]
    pub tts_binary: String,

    /// Speech speed multiplier.
    #[serde(default = "default_tts_speed")]
    pub tts_speed: f32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "courier_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    4111
}

fn default_model_name() -> String {
    "gpt-4o".to_string()
}

fn default_tool_latency_ms() -> u64 {
    4000
}

fn default_stt_model() -> String {
    "models/ggml-base.en.bin".to_string()
}

fn default_stt_binary() -> String {
    "whisper-cli".to_string()
}

fn default_tts_model() -> String {
    "models/en_US-amy-medium.onnx".to_string()
}

fn default_tts_binary() -> String {
    "piper".to_string()
}

fn default_tts_speed() -> f32 {
    1.0
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            name: default_model_name(),
            api_url: None,
            tool_latency_ms: default_tool_latency_ms(),
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            stt_model: default_stt_model(),
            stt_binary: default_stt_binary(),
            tts_model: default_tts_model(),
            tts_binary: default_tts_binary(),
            tts_speed: default_tts_speed(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `COURIER_HOST` overrides `server.host`
/// - `COURIER_PORT` overrides `server.port`
/// - `COURIER_API_KEY` overrides `model.api_key`
/// - `COURIER_MODEL` overrides `model.name`
/// - `COURIER_API_URL` overrides `model.api_url`
/// - `COURIER_LOG_LEVEL` overrides `logging.level`
/// - `COURIER_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("COURIER_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("COURIER_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(api_key) = std::env::var("COURIER_API_KEY") {
        config.model.api_key = api_key;
    }
    if let Ok(model) = std::env::var("COURIER_MODEL") {
        config.model.name = model;
    }
    if let Ok(api_url) = std::env::var("COURIER_API_URL") {
        config.model.api_url = Some(api_url);
    }
    if let Ok(level) = std::env::var("COURIER_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("COURIER_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_when_no_path() {
        let config = load_config(None).unwrap();
        assert_eq!(config.server.port, 4111);
        assert_eq!(config.model.name, "gpt-4o");
        assert_eq!(config.model.tool_latency_ms, 4000);
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 9000\n\n[model]\nname = \"gpt-4o-mini\"\ntool_latency_ms = 0"
        )
        .unwrap();

        let config = load_config(Some(file.path().to_str().unwrap())).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.model.name, "gpt-4o-mini");
        assert_eq!(config.model.tool_latency_ms, 0);
        // Untouched sections keep defaults.
        assert_eq!(config.voice.tts_speed, 1.0);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config(Some("/nonexistent/courier.toml")).unwrap();
        assert_eq!(config.server.port, 4111);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport=").unwrap();
        assert!(load_config(Some(file.path().to_str().unwrap())).is_err());
    }
}
