use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::gateway::LlmGateway;
use crate::media;
use crate::orchestrator::Orchestrator;
use crate::store::{JobStore, StoreError};
use crate::transcribe::{self, SpeechToTextClient};
use crate::types::{EvaluationJob, EvaluationReport, EvaluationRequest, JobStatus, UploadedMedia};

/// Drives one job at a time through queued → running → completed/failed.
///
/// A fallback report still counts as completion: `failed` is reserved for
/// infrastructure errors (store I/O, unexpected failures), never for
/// provider content/quality failures.
pub struct JobRunner {
    store: Arc<dyn JobStore>,
    orchestrator: Orchestrator,
    stt: SpeechToTextClient,
    work_dir: PathBuf,
}

impl JobRunner {
    pub fn new(config: Config, store: Arc<dyn JobStore>) -> Result<Self> {
        let gateway = LlmGateway::new(config.clone())?;
        let stt = SpeechToTextClient::new(config.clone())?;
        Ok(Self {
            store,
            orchestrator: Orchestrator::new(gateway),
            stt,
            work_dir: config.data_dir.join("work"),
        })
    }

    /// Create a queued job, copying each attachment into the store.
    pub async fn submit(
        &self,
        request: EvaluationRequest,
        media: Vec<UploadedMedia>,
    ) -> Result<EvaluationJob, StoreError> {
        let mut job = EvaluationJob::new(request);

        if !media.is_empty() {
            let mut stored = Vec::with_capacity(media.len());
            for item in media {
                let bytes = tokio::fs::read(&item.path).await?;
                let path = self
                    .store
                    .put_upload(&job.id, &item.file_name, &bytes)
                    .await?;
                stored.push(UploadedMedia { path, ..item });
            }
            job.media = Some(stored);
        }

        self.store.create(&job).await?;
        info!("JobRunner: submitted job {} ({})", job.id, job.target);
        Ok(job)
    }

    /// Enqueue a job onto the runtime with its own error boundary. The
    /// returned handle outlives the submitting caller; nothing is silently
    /// swallowed — `run` persists failures, and anything escaping it is
    /// logged here.
    pub fn spawn(self: &Arc<Self>, job_id: String) -> JoinHandle<()> {
        let runner = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = runner.run(&job_id).await {
                error!("JobRunner: background job {job_id} aborted: {e}");
            }
        })
    }

    /// Run one job to a terminal state. A job id absent from the store is a
    /// soft no-op: the store is external and the record may have been
    /// removed out from under us.
    pub async fn run(&self, job_id: &str) -> Result<(), StoreError> {
        let Some(mut job) = self.store.load(job_id).await? else {
            warn!("JobRunner: job {job_id} not found in store, skipping");
            return Ok(());
        };

        // Status is monotonic; a terminal job is never re-driven.
        if job.status.is_terminal() {
            warn!(
                "JobRunner: job {} is already {}, skipping",
                job.id, job.status
            );
            return Ok(());
        }

        job.status = JobStatus::Running;
        self.store.update(&mut job).await?;
        info!("JobRunner: job {} is running", job.id);

        match self.process(&job).await {
            Ok(result_path) => {
                job.status = JobStatus::Completed;
                job.result_path = Some(result_path);
                job.error = None;
                self.store.update(&mut job).await?;
                info!("JobRunner: job {} completed", job.id);
            }
            Err(e) => {
                job.status = JobStatus::Failed;
                job.error = Some(e.to_string());
                self.store.update(&mut job).await?;
                error!("JobRunner: job {} failed: {e}", job.id);
            }
        }
        Ok(())
    }

    /// Current record plus, once completed, the persisted report.
    pub async fn status(
        &self,
        job_id: &str,
    ) -> Result<Option<(EvaluationJob, Option<EvaluationReport>)>, StoreError> {
        let Some(job) = self.store.load(job_id).await? else {
            return Ok(None);
        };
        let report = if job.status == JobStatus::Completed {
            self.store.load_result(job_id).await?
        } else {
            None
        };
        Ok(Some((job, report)))
    }

    /// The orchestration path proper. Only infrastructure errors surface
    /// here; the orchestrator itself always hands back a report.
    async fn process(&self, job: &EvaluationJob) -> Result<String> {
        tokio::fs::create_dir_all(&self.work_dir).await?;

        let media_items = job.media.as_deref().unwrap_or(&[]);
        let prepared = media::prepare(&job.id, media_items, &self.work_dir).await;
        let mut warnings = prepared.warnings;

        let (transcript, transcript_warnings) =
            transcribe::resolve_transcript(&self.stt, &job.input, prepared.audio_path.as_deref())
                .await;
        warnings.extend(transcript_warnings);

        let request = job.input.resolved(
            transcript.as_ref().map(|t| t.text.clone()),
            prepared.descriptor,
        );

        let report = self.orchestrator.evaluate(&request, transcript, warnings).await;
        let result_path = self.store.put_result(&job.id, &report).await?;
        Ok(result_path)
    }
}
