use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::agents::{Agent, generate_payload};
use crate::gateway::LlmGateway;
use crate::prompts;
use crate::types::{
    AgentResult, AudioCritique, CombinedOutput, DeckCritique, DeliveryCritique, TargetKind,
};

/// Fan-in input: each upstream payload, or `None` for a stage that failed.
pub struct CombineInput {
    pub target: TargetKind,
    pub deck: Option<DeckCritique>,
    pub delivery: Option<DeliveryCritique>,
    pub audio: Option<AudioCritique>,
    pub transcript_present: bool,
}

/// Merges the three critique payloads into one unified summary, timeline
/// and recommendation list.
#[derive(Clone)]
pub struct CombinerAgent {
    gateway: LlmGateway,
}

impl CombinerAgent {
    pub fn new(gateway: LlmGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Agent for CombinerAgent {
    type Input = CombineInput;
    type Output = CombinedOutput;

    async fn execute(&self, input: &CombineInput) -> AgentResult<CombinedOutput> {
        if input.deck.is_none() && input.delivery.is_none() && input.audio.is_none() {
            return AgentResult::error("No critique agent produced usable output.");
        }

        let deck_json = json!(input.deck).to_string();
        let delivery_json = json!(input.delivery).to_string();
        let audio_json = json!(input.audio).to_string();
        let target = input.target.to_string();
        let transcript_present = input.transcript_present.to_string();

        let prompt = match prompts::render(
            "combine_report",
            &[
                ("target", &target),
                ("deck_json", &deck_json),
                ("delivery_json", &delivery_json),
                ("audio_json", &audio_json),
                ("transcript_present", &transcript_present),
            ],
        ) {
            Ok(prompt) => prompt,
            Err(e) => return AgentResult::error(e.to_string()),
        };

        info!("CombinerAgent: requesting unified report from model");
        generate_payload(&self.gateway, "report combination", &prompt).await
    }
}
