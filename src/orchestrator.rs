use chrono::Utc;
use tracing::{info, warn};

use crate::agents::{Agent, AudioAgent, CombineInput, CombinerAgent, DeckAgent, DeliveryAgent};
use crate::gateway::LlmGateway;
use crate::types::{
    AgentResult, AgentStatus, AudioCritique, DeckCritique, DeliveryCritique, EvaluationReport,
    EvaluationRequest, REPORT_VERSION, Recommendation, ReportMeta, ReportSummary, TranscriptInfo,
};

const FALLBACK_HEADLINE: &str = "Evaluation pending";

/// Fans three critique agents out concurrently, fans their results in to the
/// combiner, and always comes back with a report. No error ever escapes:
/// every failure along the way becomes a warning on the returned report.
pub struct Orchestrator {
    deck: DeckAgent,
    delivery: DeliveryAgent,
    audio: AudioAgent,
    combiner: CombinerAgent,
    model: String,
}

impl Orchestrator {
    pub fn new(gateway: LlmGateway) -> Self {
        let model = gateway.model().to_string();
        Self {
            deck: DeckAgent::new(gateway.clone()),
            delivery: DeliveryAgent::new(gateway.clone()),
            audio: AudioAgent::new(gateway.clone()),
            combiner: CombinerAgent::new(gateway),
            model,
        }
    }

    /// Produce one report for one (transcript-resolved) request.
    ///
    /// `warnings` carries notes collected upstream (media preparation,
    /// transcript resolution); agent and combiner failures are appended.
    pub async fn evaluate(
        &self,
        request: &EvaluationRequest,
        transcript: Option<TranscriptInfo>,
        mut warnings: Vec<String>,
    ) -> EvaluationReport {
        info!(
            "Orchestrator: fanning out critique agents (target {})",
            request.target
        );
        let (deck, delivery, audio) = tokio::join!(
            self.deck.execute(request),
            self.delivery.execute(request),
            self.audio.execute(request),
        );

        let deck = collect(&mut warnings, "Deck critique", deck);
        let delivery = collect(&mut warnings, "Delivery critique", delivery);
        let audio = collect(&mut warnings, "Audio critique", audio);

        let combine_input = CombineInput {
            target: request.target,
            deck: deck.clone(),
            delivery: delivery.clone(),
            audio: audio.clone(),
            transcript_present: transcript.is_some(),
        };
        let combined = self.combiner.execute(&combine_input).await;
        for note in &combined.warnings {
            warnings.push(format!("Combiner: {note}"));
        }

        let meta = ReportMeta {
            model: self.model.clone(),
            generated_at: Utc::now().to_rfc3339(),
            target: request.target,
        };

        match combined.status {
            AgentStatus::Ok(output) => {
                info!(
                    "Orchestrator: combined report ready (score {:.1})",
                    output.summary.overall_score
                );
                EvaluationReport {
                    version: REPORT_VERSION.to_string(),
                    summary: output.summary,
                    pitch_deck: deck,
                    delivery,
                    audio,
                    video: None,
                    transcript,
                    timeline: output.timeline,
                    recommendations: output.recommendations,
                    warnings: none_if_empty(warnings),
                    meta,
                }
            }
            AgentStatus::Error(message) => {
                warn!("Orchestrator: combiner failed, building fallback report: {message}");
                warnings.push(format!("Combiner failed: {message}"));
                fallback_report(deck, delivery, audio, transcript, warnings, meta)
            }
        }
    }
}

/// Record an agent's warnings and failure (if any), handing back the payload.
fn collect<T>(warnings: &mut Vec<String>, label: &str, result: AgentResult<T>) -> Option<T> {
    for note in &result.warnings {
        warnings.push(format!("{label}: {note}"));
    }
    if let Some(message) = result.error_message() {
        warn!("{label} failed: {message}");
        warnings.push(format!("{label} failed: {message}"));
    }
    result.into_payload()
}

/// Minimal always-valid report: zero score, empty lists, but every payload
/// that did succeed stays attached so the caller can see what worked.
fn fallback_report(
    deck: Option<DeckCritique>,
    delivery: Option<DeliveryCritique>,
    audio: Option<AudioCritique>,
    transcript: Option<TranscriptInfo>,
    warnings: Vec<String>,
    meta: ReportMeta,
) -> EvaluationReport {
    EvaluationReport {
        version: REPORT_VERSION.to_string(),
        summary: ReportSummary {
            overall_score: 0.0,
            headline: FALLBACK_HEADLINE.to_string(),
            highlights: Vec::new(),
            risks: Vec::new(),
        },
        pitch_deck: deck,
        delivery,
        audio,
        video: None,
        transcript,
        timeline: None,
        recommendations: Vec::<Recommendation>::new(),
        warnings: none_if_empty(warnings),
        meta,
    }
}

fn none_if_empty(warnings: Vec<String>) -> Option<Vec<String>> {
    if warnings.is_empty() {
        None
    } else {
        Some(warnings)
    }
}
