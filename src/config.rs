use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Process-wide configuration, loaded once at startup from the environment.
///
/// Provider credentials may legitimately be absent: the gateway and the
/// speech-to-text client detect that before any network call and surface it
/// as an agent-level error rather than a startup failure.
#[derive(Debug, Clone)]
pub struct Config {
    /// LLM provider API key (`LLM_API_KEY`). Empty means not configured.
    pub api_key: String,
    /// Base URL of the OpenAI-compatible chat endpoint (`LLM_BASE_URL`).
    pub base_url: String,
    /// Default model identifier (`LLM_MODEL`).
    pub model: String,
    /// Per-request timeout in seconds (`LLM_TIMEOUT_SECS`).
    pub timeout: u64,
    /// Completion token cap (`LLM_MAX_TOKENS`).
    pub max_tokens: u32,
    /// Sampling temperature (`LLM_TEMPERATURE`).
    pub temperature: f32,
    /// Speech-to-text provider API key (`STT_API_KEY`). Empty means not configured.
    pub stt_api_key: String,
    /// Base URL of the transcription endpoint (`STT_BASE_URL`).
    pub stt_base_url: String,
    /// Transcription model identifier (`STT_MODEL`).
    pub stt_model: String,
    /// Optional language hint passed to the transcription provider (`STT_LANGUAGE`).
    pub language_hint: Option<String>,
    /// Root directory for the file-backed job store (`DATA_DIR`).
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout: 60,
            max_tokens: 2048,
            temperature: 0.3,
            stt_api_key: String::new(),
            stt_base_url: "https://api.openai.com/v1".to_string(),
            stt_model: "whisper-1".to_string(),
            language_hint: None,
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn load() -> Result<Self> {
        let defaults = Self::default();

        let timeout = match env::var("LLM_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("LLM_TIMEOUT_SECS is not a valid integer: {raw}"))?,
            Err(_) => defaults.timeout,
        };
        let max_tokens = match env::var("LLM_MAX_TOKENS") {
            Ok(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("LLM_MAX_TOKENS is not a valid integer: {raw}"))?,
            Err(_) => defaults.max_tokens,
        };
        let temperature = match env::var("LLM_TEMPERATURE") {
            Ok(raw) => raw
                .parse::<f32>()
                .with_context(|| format!("LLM_TEMPERATURE is not a valid number: {raw}"))?,
            Err(_) => defaults.temperature,
        };

        Ok(Self {
            api_key: env::var("LLM_API_KEY").unwrap_or_default(),
            base_url: env::var("LLM_BASE_URL").unwrap_or(defaults.base_url),
            model: env::var("LLM_MODEL").unwrap_or(defaults.model),
            timeout,
            max_tokens,
            temperature,
            stt_api_key: env::var("STT_API_KEY").unwrap_or_default(),
            stt_base_url: env::var("STT_BASE_URL").unwrap_or(defaults.stt_base_url),
            stt_model: env::var("STT_MODEL").unwrap_or(defaults.stt_model),
            language_hint: env::var("STT_LANGUAGE").ok().filter(|l| !l.is_empty()),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
        })
    }

    /// Well-formedness check, independent of whether credentials are present.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("base_url must not be empty".to_string());
        }
        if self.timeout == 0 {
            return Err("timeout must be greater than zero".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "temperature must be within [0.0, 2.0], got {}",
                self.temperature
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let cfg = Config {
            timeout: 0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_temperature() {
        let cfg = Config {
            temperature: 3.5,
            ..Config::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.contains("temperature"));
    }
}
