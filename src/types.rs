use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Schema version stamped on every report.
pub const REPORT_VERSION: &str = "report_v1";

/// What the caller asked to have evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    #[default]
    Full,
    PitchDeck,
    Delivery,
    Audio,
    Video,
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TargetKind::Full => "full",
            TargetKind::PitchDeck => "pitch_deck",
            TargetKind::Delivery => "delivery",
            TargetKind::Audio => "audio",
            TargetKind::Video => "video",
        };
        f.write_str(s)
    }
}

impl FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(TargetKind::Full),
            "pitch_deck" | "deck" => Ok(TargetKind::PitchDeck),
            "delivery" => Ok(TargetKind::Delivery),
            "audio" => Ok(TargetKind::Audio),
            "video" => Ok(TargetKind::Video),
            other => Err(format!("unknown target: {other}")),
        }
    }
}

/// Immutable evaluation input. The pipeline never mutates a request in
/// place; transcript and audio-summary resolution derive a new value via
/// [`EvaluationRequest::resolved`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EvaluationRequest {
    pub target: TargetKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deck_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
}

impl EvaluationRequest {
    /// Derive a new request with the resolved transcript and audio summary
    /// filled in. Caller-supplied values always win over resolved ones.
    pub fn resolved(&self, transcript: Option<String>, audio_summary: String) -> Self {
        let mut next = self.clone();
        if next.transcript.as_deref().map_or(true, str::is_empty) {
            next.transcript = transcript;
        }
        if next.audio_summary.as_deref().map_or(true, str::is_empty) {
            next.audio_summary = Some(audio_summary);
        }
        next
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Audio,
    Other,
}

/// One uploaded file attached to a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedMedia {
    pub kind: MediaKind,
    pub path: PathBuf,
    pub mime_type: String,
    pub file_name: String,
    pub size_bytes: u64,
}

/// Outcome tag of one agent stage.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentStatus<T> {
    Ok(T),
    Error(String),
}

/// The uniform contract every agent stage returns. The orchestrator only
/// ever inspects the tag and the attached warnings, never error internals.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentResult<T> {
    pub status: AgentStatus<T>,
    pub warnings: Vec<String>,
}

impl<T> AgentResult<T> {
    pub fn ok(payload: T) -> Self {
        Self {
            status: AgentStatus::Ok(payload),
            warnings: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: AgentStatus::Error(message.into()),
            warnings: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.status, AgentStatus::Ok(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            AgentStatus::Ok(_) => None,
            AgentStatus::Error(message) => Some(message),
        }
    }

    pub fn into_payload(self) -> Option<T> {
        match self.status {
            AgentStatus::Ok(payload) => Some(payload),
            AgentStatus::Error(_) => None,
        }
    }
}

/// Job lifecycle. Transitions are monotonic: queued < running < terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn rank(self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Running => 1,
            JobStatus::Completed | JobStatus::Failed => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Persistent record of one evaluation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationJob {
    pub id: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub target: TargetKind,
    pub input: EvaluationRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<UploadedMedia>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvaluationJob {
    pub fn new(input: EvaluationRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            status: JobStatus::Queued,
            created_at: now,
            updated_at: now,
            target: input.target,
            input,
            media: None,
            result_path: None,
            error: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Report family. These serialize camelCase: they are the wire shape the web
// client consumes.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub overall_score: f64,
    pub headline: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptSource {
    User,
    Provider,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptInfo {
    pub source: TranscriptSource,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<TranscriptSegment>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub label: String,
    pub score: f64,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub priority: u32,
    pub area: String,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckCritique {
    pub score: f64,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryCritique {
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace: Option<String>,
    #[serde(default)]
    pub fillers: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioCritique {
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace_wpm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<String>,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// What the combiner agent returns: the unified slice of the final report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedOutput {
    pub summary: ReportSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Vec<TimelineEvent>>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    pub model: String,
    pub generated_at: String,
    pub target: TargetKind,
}

/// Terminal artifact of one evaluation. `summary`, `meta` and
/// `recommendations` are always present, fallback reports included;
/// `warnings` is omitted entirely when there is nothing to report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    pub version: String,
    pub summary: ReportSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch_deck: Option<DeckCritique>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryCritique>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioCritique>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<TranscriptInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Vec<TimelineEvent>>,
    pub recommendations: Vec<Recommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
    pub meta: ReportMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_result_accessors() {
        let ok: AgentResult<u32> = AgentResult::ok(7);
        assert!(ok.is_ok());
        assert_eq!(ok.error_message(), None);
        assert_eq!(ok.into_payload(), Some(7));

        let err: AgentResult<u32> = AgentResult::error("boom");
        assert!(!err.is_ok());
        assert_eq!(err.error_message(), Some("boom"));
        assert_eq!(err.into_payload(), None);
    }

    #[test]
    fn job_status_is_monotonic() {
        assert!(JobStatus::Queued.rank() < JobStatus::Running.rank());
        assert!(JobStatus::Running.rank() < JobStatus::Completed.rank());
        assert_eq!(JobStatus::Completed.rank(), JobStatus::Failed.rank());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }

    #[test]
    fn resolved_request_prefers_caller_values() {
        let request = EvaluationRequest {
            transcript: Some("mine".to_string()),
            ..EvaluationRequest::default()
        };
        let derived = request.resolved(Some("provider".to_string()), "audio".to_string());
        assert_eq!(derived.transcript.as_deref(), Some("mine"));
        assert_eq!(derived.audio_summary.as_deref(), Some("audio"));
        // The original is untouched.
        assert_eq!(request.audio_summary, None);
    }

    #[test]
    fn report_serializes_camel_case_and_omits_empty_warnings() {
        let report = EvaluationReport {
            version: REPORT_VERSION.to_string(),
            summary: ReportSummary {
                overall_score: 42.0,
                headline: "ok".to_string(),
                highlights: vec![],
                risks: vec![],
            },
            pitch_deck: None,
            delivery: None,
            audio: None,
            video: None,
            transcript: None,
            timeline: None,
            recommendations: vec![],
            warnings: None,
            meta: ReportMeta {
                model: "m".to_string(),
                generated_at: "t".to_string(),
                target: TargetKind::Full,
            },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["summary"]["overallScore"], 42.0);
        assert!(json["summary"].is_object());
        assert!(json["meta"].is_object());
        assert!(json["recommendations"].is_array());
        assert!(json.get("warnings").is_none());
        assert!(json.get("pitchDeck").is_none());
    }

    #[test]
    fn target_kind_parses_aliases() {
        assert_eq!("deck".parse::<TargetKind>().unwrap(), TargetKind::PitchDeck);
        assert_eq!("FULL".parse::<TargetKind>().unwrap(), TargetKind::Full);
        assert!("slides".parse::<TargetKind>().is_err());
    }
}
