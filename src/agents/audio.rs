use async_trait::async_trait;
use tracing::info;

use crate::agents::{Agent, MISSING_TRANSCRIPT, generate_payload};
use crate::gateway::LlmGateway;
use crate::prompts;
use crate::types::{AgentResult, AudioCritique, EvaluationRequest};

/// Critiques the vocal performance. The transcript doubles as the proxy
/// signal here, alongside the descriptive audio summary.
#[derive(Clone)]
pub struct AudioAgent {
    gateway: LlmGateway,
}

impl AudioAgent {
    pub fn new(gateway: LlmGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Agent for AudioAgent {
    type Input = EvaluationRequest;
    type Output = AudioCritique;

    async fn execute(&self, request: &EvaluationRequest) -> AgentResult<AudioCritique> {
        let Some(transcript) = request.transcript.as_deref().filter(|t| !t.trim().is_empty())
        else {
            return AgentResult::error(MISSING_TRANSCRIPT);
        };

        let prompt = match prompts::render(
            "audio_critique",
            &[
                (
                    "audio_summary",
                    request
                        .audio_summary
                        .as_deref()
                        .unwrap_or("no audio available"),
                ),
                ("transcript", transcript),
                ("context", request.context.as_deref().unwrap_or("none")),
            ],
        ) {
            Ok(prompt) => prompt,
            Err(e) => return AgentResult::error(e.to_string()),
        };

        info!("AudioAgent: requesting audio critique from model");
        generate_payload(&self.gateway, "audio critique", &prompt).await
    }
}
