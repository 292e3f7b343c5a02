use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::types::{EvaluationRequest, TranscriptInfo, TranscriptSegment, TranscriptSource};

#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("Speech-to-text API key is not configured (set STT_API_KEY)")]
    MissingCredentials,

    #[error("Failed to read audio file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network connection failed: {message}")]
    Network { message: String },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {message}")]
    Parse { message: String },
}

/// Provider response: transcript text plus optional timed segments.
#[derive(Debug, Deserialize)]
pub struct TranscriptionResponse {
    pub text: String,
    #[serde(default)]
    pub segments: Option<Vec<TranscriptSegment>>,
}

/// Client for the external speech-to-text provider. The request carries the
/// raw audio bytes; model and language hint travel as query parameters.
#[derive(Debug, Clone)]
pub struct SpeechToTextClient {
    client: Client,
    config: Config,
}

impl SpeechToTextClient {
    pub fn new(config: Config) -> Result<Self, TranscribeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent("pitch_coach/0.1.0")
            .build()
            .map_err(|e| TranscribeError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client, config })
    }

    /// Transcribe the audio file at `audio_path`. Missing credentials are a
    /// first-class error, detected before the file is even read.
    pub async fn transcribe(
        &self,
        audio_path: &Path,
    ) -> Result<TranscriptionResponse, TranscribeError> {
        if self.config.stt_api_key.trim().is_empty() {
            return Err(TranscribeError::MissingCredentials);
        }

        let bytes = tokio::fs::read(audio_path).await?;
        info!(
            "SpeechToText: transcribing {} ({} bytes)",
            audio_path.display(),
            bytes.len()
        );

        let mut request = self
            .client
            .post(format!("{}/audio/transcriptions", self.config.stt_base_url))
            .header("Authorization", format!("Bearer {}", self.config.stt_api_key))
            .header("Content-Type", "application/octet-stream")
            .query(&[("model", self.config.stt_model.as_str())])
            .body(bytes);
        if let Some(language) = &self.config.language_hint {
            request = request.query(&[("language", language.as_str())]);
        }

        let response = request.send().await.map_err(|e| TranscribeError::Network {
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TranscribeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<TranscriptionResponse>()
            .await
            .map_err(|e| TranscribeError::Parse {
                message: e.to_string(),
            })
    }
}

/// Resolve the transcript for a request: a caller-supplied transcript wins
/// verbatim; otherwise the prepared audio is sent to the provider. Any
/// failure becomes a warning and the pipeline continues without a
/// transcript.
pub async fn resolve_transcript(
    stt: &SpeechToTextClient,
    request: &EvaluationRequest,
    audio_path: Option<&Path>,
) -> (Option<TranscriptInfo>, Vec<String>) {
    if let Some(text) = request.transcript.as_deref().filter(|t| !t.trim().is_empty()) {
        return (
            Some(TranscriptInfo {
                source: TranscriptSource::User,
                text: text.to_string(),
                segments: None,
            }),
            Vec::new(),
        );
    }

    let Some(audio_path) = audio_path else {
        return (None, Vec::new());
    };

    match stt.transcribe(audio_path).await {
        Ok(transcription) => (
            Some(TranscriptInfo {
                source: TranscriptSource::Provider,
                text: transcription.text,
                segments: transcription.segments,
            }),
            Vec::new(),
        ),
        Err(e) => {
            warn!("SpeechToText: transcription failed: {e}");
            (None, vec![format!("Transcription failed: {e}")])
        }
    }
}
