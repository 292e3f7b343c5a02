use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pitch_coach::config::Config;
use pitch_coach::gateway::{LlmGateway, call_with_retry};
use pitch_coach::orchestrator::Orchestrator;
use pitch_coach::runner::JobRunner;
use pitch_coach::store::{FileJobStore, JobStore};
use pitch_coach::types::{
    EvaluationRequest, JobStatus, TargetKind, TranscriptSource,
};

fn test_config(base_url: &str, data_dir: &Path) -> Config {
    Config {
        api_key: "test-key".to_string(),
        base_url: base_url.to_string(),
        model: "test-model".to_string(),
        timeout: 5,
        max_tokens: 512,
        temperature: 0.0,
        data_dir: data_dir.to_path_buf(),
        ..Config::default()
    }
}

fn llm_body(content: &str) -> serde_json::Value {
    json!({
        "choices": [
            { "message": { "role": "assistant", "content": content } }
        ]
    })
}

async fn mount_agent_mock(server: &MockServer, marker: &str, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains(marker))
        .respond_with(ResponseTemplate::new(200).set_body_json(llm_body(content)))
        .mount(server)
        .await;
}

const DECK_RESPONSE: &str = r#"```json
{"score": 81.0, "strengths": ["clear problem"], "weaknesses": ["no traction slide"], "suggestions": ["add metrics"]}
```"#;

const DELIVERY_RESPONSE: &str =
    r#"{"score": 68.0, "clarity": "mostly clear", "pace": "rushed ending", "fillers": ["um"], "suggestions": ["pause more"]}"#;

const AUDIO_RESPONSE: &str =
    r#"{"score": 70.0, "paceWpm": 162.0, "energy": "steady", "notes": ["slight echo"]}"#;

const COMBINED_RESPONSE: &str = r#"{
    "summary": {
        "overallScore": 74.0,
        "headline": "Solid story, tighten the close",
        "highlights": ["clear problem"],
        "risks": ["rushed ending"]
    },
    "timeline": [
        {"label": "opening", "score": 80.0, "note": "strong hook"}
    ],
    "recommendations": [
        {"priority": 1, "area": "delivery", "action": "slow down the final third"}
    ]
}"#;

// Scenario A: deck text only. Deck succeeds, delivery and audio short-circuit
// on the missing transcript, the combiner still produces a full report.
#[tokio::test]
async fn deck_only_request_yields_partial_report() {
    let server = MockServer::start().await;
    mount_agent_mock(&server, "deck critique agent", DECK_RESPONSE).await;
    mount_agent_mock(&server, "combiner agent", COMBINED_RESPONSE).await;

    let dir = tempfile::tempdir().unwrap();
    let gateway = LlmGateway::new(test_config(&server.uri(), dir.path())).unwrap();
    let orchestrator = Orchestrator::new(gateway);

    let request = EvaluationRequest {
        target: TargetKind::PitchDeck,
        deck_text: Some("Problem: X. Solution: Y.".to_string()),
        ..EvaluationRequest::default()
    };
    let report = orchestrator.evaluate(&request, None, Vec::new()).await;

    let deck = report.pitch_deck.expect("deck critique should be present");
    assert_eq!(deck.score, 81.0);
    assert!(report.delivery.is_none());
    assert!(report.audio.is_none());
    assert_eq!(report.summary.overall_score, 74.0);
    assert_eq!(report.summary.headline, "Solid story, tighten the close");
    assert_eq!(report.recommendations.len(), 1);

    let warnings = report.warnings.expect("warnings should be present");
    let transcript_warnings: Vec<_> = warnings
        .iter()
        .filter(|w| w.contains("Transcript is missing."))
        .collect();
    assert_eq!(transcript_warnings.len(), 2);
}

// Scenario B: every precondition fails. The combiner still runs (and
// short-circuits), producing exactly the fallback shape.
#[tokio::test]
async fn empty_request_yields_fallback_report() {
    let dir = tempfile::tempdir().unwrap();
    // No mock server: nothing should reach the network at all.
    let gateway = LlmGateway::new(test_config("http://127.0.0.1:9", dir.path())).unwrap();
    let orchestrator = Orchestrator::new(gateway);

    let report = orchestrator
        .evaluate(&EvaluationRequest::default(), None, Vec::new())
        .await;

    assert_eq!(report.summary.overall_score, 0.0);
    assert_eq!(report.summary.headline, "Evaluation pending");
    assert!(report.summary.highlights.is_empty());
    assert!(report.summary.risks.is_empty());
    assert!(report.recommendations.is_empty());
    assert!(report.timeline.is_none());
    assert!(report.pitch_deck.is_none());

    let warnings = report.warnings.expect("warnings should be present");
    assert_eq!(warnings.len(), 4);
    assert!(warnings[0].contains("Deck text is missing."));
    assert!(warnings[1].contains("Transcript is missing."));
    assert!(warnings[2].contains("Transcript is missing."));
    assert!(warnings[3].contains("Combiner failed"));
}

// Transient 5xx failures are retried; the third attempt succeeds.
#[tokio::test]
async fn gateway_retries_transient_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("flaky"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(llm_body("{\"a\":1}")))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let gateway = LlmGateway::new(test_config(&server.uri(), dir.path())).unwrap();

    let raw = call_with_retry("test call", || gateway.generate("hello"))
        .await
        .unwrap();
    assert_eq!(raw, "{\"a\":1}");
}

// Quota errors are never retried: exactly one request reaches the provider.
#[tokio::test]
async fn gateway_fails_fast_on_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limit exceeded"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let gateway = LlmGateway::new(test_config(&server.uri(), dir.path())).unwrap();

    let err = call_with_retry("test call", || gateway.generate("hello"))
        .await
        .unwrap_err();
    assert!(err.is_quota());
    server.verify().await;
}

// Full job lifecycle: submit, run, poll. A user transcript keeps all three
// critique agents in play.
#[tokio::test]
async fn job_runs_to_completion() {
    let server = MockServer::start().await;
    mount_agent_mock(&server, "deck critique agent", DECK_RESPONSE).await;
    mount_agent_mock(&server, "delivery critique agent", DELIVERY_RESPONSE).await;
    mount_agent_mock(&server, "audio critique agent", AUDIO_RESPONSE).await;
    mount_agent_mock(&server, "combiner agent", COMBINED_RESPONSE).await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server.uri(), dir.path());
    let store = Arc::new(FileJobStore::new(dir.path()));
    let runner = JobRunner::new(config, store.clone()).unwrap();

    let request = EvaluationRequest {
        target: TargetKind::Full,
        deck_text: Some("Problem: X. Solution: Y.".to_string()),
        transcript: Some("Good morning everyone, today I want to show you X.".to_string()),
        context: Some("seed round pitch".to_string()),
        ..EvaluationRequest::default()
    };
    let job = runner.submit(request.clone(), Vec::new()).await.unwrap();

    // Freshly submitted jobs poll as queued with the submitted input intact.
    let (queued, none_yet) = runner.status(&job.id).await.unwrap().unwrap();
    assert_eq!(queued.status, JobStatus::Queued);
    assert_eq!(queued.input, request);
    assert!(none_yet.is_none());

    runner.run(&job.id).await.unwrap();

    let (done, report) = runner.status(&job.id).await.unwrap().unwrap();
    assert_eq!(done.status, JobStatus::Completed);
    assert!(done.error.is_none());
    assert!(done.result_path.is_some());
    assert!(done.updated_at >= done.created_at);

    let report = report.expect("completed job should have a report");
    assert_eq!(report.summary.overall_score, 74.0);
    assert!(report.pitch_deck.is_some());
    assert!(report.delivery.is_some());
    assert!(report.audio.is_some());
    let transcript = report.transcript.expect("transcript info should be present");
    assert_eq!(transcript.source, TranscriptSource::User);
    assert_eq!(transcript.text, "Good morning everyone, today I want to show you X.");
    assert!(report.warnings.is_none());

    // The result blob is persisted where the record points.
    let result_path = dir.path().join(done.result_path.unwrap());
    assert!(result_path.exists());
}

// Re-running a terminal job is a no-op: status never regresses and the
// stored record is untouched.
#[tokio::test]
async fn terminal_job_is_never_re_driven() {
    let server = MockServer::start().await;
    mount_agent_mock(&server, "deck critique agent", DECK_RESPONSE).await;
    mount_agent_mock(&server, "combiner agent", COMBINED_RESPONSE).await;

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&server.uri(), dir.path());
    let store = Arc::new(FileJobStore::new(dir.path()));
    let runner = JobRunner::new(config, store.clone()).unwrap();

    let request = EvaluationRequest {
        deck_text: Some("Problem: X. Solution: Y.".to_string()),
        ..EvaluationRequest::default()
    };
    let job = runner.submit(request, Vec::new()).await.unwrap();
    runner.run(&job.id).await.unwrap();

    let first = store.load(&job.id).await.unwrap().unwrap();
    assert_eq!(first.status, JobStatus::Completed);

    runner.run(&job.id).await.unwrap();

    let second = store.load(&job.id).await.unwrap().unwrap();
    assert_eq!(second.status, JobStatus::Completed);
    assert_eq!(second.updated_at, first.updated_at);
}

// Scenario E: a job id absent from the store is a soft no-op.
#[tokio::test]
async fn missing_job_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config("http://127.0.0.1:9", dir.path());
    let store = Arc::new(FileJobStore::new(dir.path()));
    let runner = JobRunner::new(config, store.clone()).unwrap();

    runner.run("no-such-job").await.unwrap();

    assert!(store.load("no-such-job").await.unwrap().is_none());
    assert!(!dir.path().join("jobs").join("no-such-job").exists());
}

// Orchestrator failures are not job failures: with the provider entirely
// unreachable the job still completes, carrying a fallback report.
#[tokio::test]
async fn unreachable_provider_still_completes_the_job() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config("http://127.0.0.1:9", dir.path());
    let store = Arc::new(FileJobStore::new(dir.path()));
    let runner = JobRunner::new(config, store).unwrap();

    let request = EvaluationRequest {
        deck_text: Some("Problem: X.".to_string()),
        ..EvaluationRequest::default()
    };
    let job = runner.submit(request, Vec::new()).await.unwrap();
    runner.run(&job.id).await.unwrap();

    let (done, report) = runner.status(&job.id).await.unwrap().unwrap();
    assert_eq!(done.status, JobStatus::Completed);
    let report = report.unwrap();
    assert_eq!(report.summary.overall_score, 0.0);
    assert_eq!(report.summary.headline, "Evaluation pending");
    let warnings = report.warnings.unwrap();
    assert!(warnings.iter().any(|w| w.contains("Deck critique failed")));
}
