use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;

/// Markers that identify a quota/rate-limit failure. Retrying those within a
/// short window is pointless, so they fail fast.
const QUOTA_MARKERS: [&str; 4] = ["quota", "rate limit", "resource_exhausted", "429"];

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Custom error types for LLM provider interactions
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("LLM API key is not configured (set LLM_API_KEY)")]
    MissingCredentials,

    #[error("Network connection failed: {message}")]
    Network { message: String },

    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {message}")]
    Parse { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{label} failed after {attempts} attempts: {message}")]
    RetriesExhausted {
        label: String,
        attempts: u32,
        message: String,
    },
}

impl GatewayError {
    /// Whether this error is a quota/rate-limit signal that should not be retried.
    pub fn is_quota(&self) -> bool {
        is_quota_message(&self.to_string())
    }
}

/// Case-insensitive substring scan across the known quota marker strings.
pub fn is_quota_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    QUOTA_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

const SYSTEM_PROMPT: &str =
    "You are a presentation coach. Always respond with a single valid JSON object and nothing else.";

/// Thin client over an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct LlmGateway {
    client: Client,
    config: Config,
}

impl LlmGateway {
    /// Create a new gateway with the given configuration.
    pub fn new(config: Config) -> Result<Self, GatewayError> {
        config.validate().map_err(|e| GatewayError::Config {
            message: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent("pitch_coach/0.1.0")
            .build()
            .map_err(|e| GatewayError::Config {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self { client, config })
    }

    /// Default model identifier this gateway sends requests with.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send one prompt and return the raw assistant content string.
    /// Missing credentials are detected before any network call.
    pub async fn generate(&self, user_prompt: &str) -> Result<String, GatewayError> {
        if self.config.api_key.trim().is_empty() {
            return Err(GatewayError::MissingCredentials);
        }

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(handle_error_response(status, response).await);
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| GatewayError::Parse {
                message: format!("Failed to parse API response: {e}"),
            })?;

        match api_response.choices.first() {
            Some(choice) => Ok(choice.message.content.clone()),
            None => Err(GatewayError::Parse {
                message: "No choices in API response".to_string(),
            }),
        }
    }

    /// Map reqwest errors to our custom error types
    fn map_reqwest_error(&self, error: reqwest::Error) -> GatewayError {
        if error.is_timeout() {
            return GatewayError::Timeout {
                seconds: self.config.timeout,
            };
        }

        if error.is_connect() {
            return GatewayError::Network {
                message: "Failed to connect to server".to_string(),
            };
        }

        if error.is_request() {
            return GatewayError::Network {
                message: "Request failed".to_string(),
            };
        }

        GatewayError::Network {
            message: format!("Request error: {error}"),
        }
    }
}

/// Normalize a non-2xx response into a single descriptive error.
async fn handle_error_response(status: StatusCode, response: reqwest::Response) -> GatewayError {
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    GatewayError::Api {
        status: status.as_u16(),
        message,
    }
}

/// Run `call` up to three times with linearly increasing backoff between
/// attempts. Quota errors surface immediately; exhausting the attempts raises
/// an error labeled with the failing call site.
pub async fn call_with_retry<T, F, Fut>(label: &str, mut call: F) -> Result<T, GatewayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    let mut last_message = String::new();
    for attempt in 1..=MAX_ATTEMPTS {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_quota() => {
                tracing::warn!("{label}: quota error, not retrying: {e}");
                return Err(e);
            }
            Err(e) => {
                last_message = e.to_string();
                if attempt < MAX_ATTEMPTS {
                    let delay = RETRY_BASE_DELAY * attempt;
                    tracing::warn!(
                        "{label}: attempt {attempt} failed: {e}; retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
    Err(GatewayError::RetriesExhausted {
        label: label.to_string(),
        attempts: MAX_ATTEMPTS,
        message: last_message,
    })
}

/// Best-effort extraction of a JSON object from free-form model output.
///
/// Strategies, in order: the whole (trimmed) string is a JSON object; the
/// first fenced code block holds one; the outermost `{...}` span holds one.
pub fn extract_json(text: &str) -> Option<&str> {
    fn is_object(candidate: &str) -> bool {
        serde_json::from_str::<serde_json::Value>(candidate)
            .map(|v| v.is_object())
            .unwrap_or(false)
    }

    let trimmed = text.trim();
    if is_object(trimmed) {
        return Some(trimmed);
    }

    // Fenced code block, optionally tagged (```json ... ```).
    if let Some(open) = text.find("```") {
        let after_fence = &text[open + 3..];
        let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_fence[body_start..];
        if let Some(close) = body.find("```") {
            let candidate = body[..close].trim();
            if is_object(candidate) {
                return Some(candidate);
            }
        }
    }

    // First `{` to last `}` span.
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        let candidate = text[start..=end].trim();
        if is_object(candidate) {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn extract_json_accepts_whole_string() {
        assert_eq!(extract_json(r#"  {"a": 1}  "#), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn extract_json_unwraps_fenced_block() {
        let text = "```json\n{\"a\":1}\n```";
        assert_eq!(extract_json(text), Some(r#"{"a":1}"#));
    }

    #[test]
    fn extract_json_unwraps_untagged_fence() {
        let text = "Here you go:\n```\n{\"b\": 2}\n```\nHope that helps!";
        assert_eq!(extract_json(text), Some(r#"{"b": 2}"#));
    }

    #[test]
    fn extract_json_falls_back_to_brace_span() {
        let text = "Sure! The critique is {\"score\": 80} as requested.";
        assert_eq!(extract_json(text), Some(r#"{"score": 80}"#));
    }

    #[test]
    fn extract_json_rejects_text_without_object() {
        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json("[1, 2, 3]"), None);
        assert_eq!(extract_json("{not valid"), None);
    }

    #[test]
    fn quota_markers_match_case_insensitively() {
        assert!(is_quota_message("RESOURCE_EXHAUSTED: try later"));
        assert!(is_quota_message("Rate Limit hit"));
        assert!(is_quota_message("API error (429): slow down"));
        assert!(is_quota_message("monthly quota exceeded"));
        assert!(!is_quota_message("connection reset by peer"));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_succeeds_on_third_attempt() {
        let calls = AtomicU32::new(0);
        let result = call_with_retry("test call", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(GatewayError::Network {
                        message: "transient".to_string(),
                    })
                } else {
                    Ok(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_fails_fast_on_quota_error() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, _> = call_with_retry("test call", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(GatewayError::Api {
                    status: 429,
                    message: "quota exceeded".to_string(),
                })
            }
        })
        .await;
        assert!(result.unwrap_err().is_quota());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_exhaustion_is_labeled() {
        let result: Result<u32, _> = call_with_retry("deck critique", || async {
            Err(GatewayError::Network {
                message: "transient".to_string(),
            })
        })
        .await;
        let message = result.unwrap_err().to_string();
        assert!(message.contains("deck critique"));
        assert!(message.contains("3 attempts"));
    }
}
