use async_trait::async_trait;
use tracing::info;

use crate::agents::{Agent, MISSING_TRANSCRIPT, generate_payload};
use crate::gateway::LlmGateway;
use crate::prompts;
use crate::types::{AgentResult, DeliveryCritique, EvaluationRequest};

/// Critiques the spoken delivery from the resolved transcript.
#[derive(Clone)]
pub struct DeliveryAgent {
    gateway: LlmGateway,
}

impl DeliveryAgent {
    pub fn new(gateway: LlmGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Agent for DeliveryAgent {
    type Input = EvaluationRequest;
    type Output = DeliveryCritique;

    async fn execute(&self, request: &EvaluationRequest) -> AgentResult<DeliveryCritique> {
        let Some(transcript) = request.transcript.as_deref().filter(|t| !t.trim().is_empty())
        else {
            return AgentResult::error(MISSING_TRANSCRIPT);
        };

        let prompt = match prompts::render(
            "delivery_critique",
            &[
                ("transcript", transcript),
                ("context", request.context.as_deref().unwrap_or("none")),
            ],
        ) {
            Ok(prompt) => prompt,
            Err(e) => return AgentResult::error(e.to_string()),
        };

        info!("DeliveryAgent: requesting delivery critique from model");
        generate_payload(&self.gateway, "delivery critique", &prompt).await
    }
}
