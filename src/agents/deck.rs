use async_trait::async_trait;
use tracing::info;

use crate::agents::{Agent, MISSING_DECK_TEXT, generate_payload};
use crate::gateway::LlmGateway;
use crate::prompts;
use crate::types::{AgentResult, DeckCritique, EvaluationRequest};

/// Critiques the slide deck text. Requires non-empty deck text; short-circuits
/// without touching the gateway when it is absent.
#[derive(Clone)]
pub struct DeckAgent {
    gateway: LlmGateway,
}

impl DeckAgent {
    pub fn new(gateway: LlmGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Agent for DeckAgent {
    type Input = EvaluationRequest;
    type Output = DeckCritique;

    async fn execute(&self, request: &EvaluationRequest) -> AgentResult<DeckCritique> {
        let Some(deck_text) = request.deck_text.as_deref().filter(|t| !t.trim().is_empty())
        else {
            return AgentResult::error(MISSING_DECK_TEXT);
        };

        let prompt = match prompts::render(
            "deck_critique",
            &[
                ("deck_text", deck_text),
                ("context", request.context.as_deref().unwrap_or("none")),
            ],
        ) {
            Ok(prompt) => prompt,
            Err(e) => return AgentResult::error(e.to_string()),
        };

        info!("DeckAgent: requesting deck critique from model");
        generate_payload(&self.gateway, "deck critique", &prompt).await
    }
}
