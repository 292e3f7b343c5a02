use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::gateway::{LlmGateway, call_with_retry, extract_json};
use crate::types::AgentResult;

/// Fixed precondition messages. Downstream consumers match on these.
pub const MISSING_DECK_TEXT: &str = "Deck text is missing.";
pub const MISSING_TRANSCRIPT: &str = "Transcript is missing.";

/// One critique stage. Agents never propagate errors as `Err`: every
/// failure, preconditions included, lands in the [`AgentResult`] error tag
/// so that one agent failing can never abort the others.
#[async_trait]
pub trait Agent {
    type Input: Send + Sync;
    type Output: Send + Sync;
    async fn execute(&self, input: &Self::Input) -> AgentResult<Self::Output>;
}

/// Shared request path: retry-wrapped gateway call, JSON extraction, parse.
pub(crate) async fn generate_payload<T: DeserializeOwned>(
    gateway: &LlmGateway,
    label: &str,
    prompt: &str,
) -> AgentResult<T> {
    let raw = match call_with_retry(label, || gateway.generate(prompt)).await {
        Ok(raw) => raw,
        Err(e) => return AgentResult::error(e.to_string()),
    };
    let Some(json) = extract_json(&raw) else {
        return AgentResult::error(format!("{label}: model response contained no JSON object"));
    };
    match serde_json::from_str(json) {
        Ok(payload) => AgentResult::ok(payload),
        Err(e) => AgentResult::error(format!("{label}: failed to parse model JSON: {e}")),
    }
}

pub mod audio;
pub mod combiner;
pub mod deck;
pub mod delivery;

pub use audio::AudioAgent;
pub use combiner::{CombineInput, CombinerAgent};
pub use deck::DeckAgent;
pub use delivery::DeliveryAgent;
