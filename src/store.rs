use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tracing::info;

use crate::types::{EvaluationJob, EvaluationReport};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

/// Durable mapping from job id to job record and result payload. One record
/// and one result blob per id; updates are whole-record writes (last write
/// wins) and always refresh the update timestamp.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, job: &EvaluationJob) -> Result<(), StoreError>;
    async fn load(&self, job_id: &str) -> Result<Option<EvaluationJob>, StoreError>;
    async fn update(&self, job: &mut EvaluationJob) -> Result<(), StoreError>;
    async fn put_result(
        &self,
        job_id: &str,
        report: &EvaluationReport,
    ) -> Result<String, StoreError>;
    async fn load_result(&self, job_id: &str) -> Result<Option<EvaluationReport>, StoreError>;
    async fn put_upload(
        &self,
        job_id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, StoreError>;
}

/// File-backed store: `jobs/<id>/job.json`, `jobs/<id>/report.json` and
/// `jobs/<id>/uploads/<sanitized name>` under the configured root.
pub struct FileJobStore {
    root: PathBuf,
}

impl FileJobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn job_dir(&self, job_id: &str) -> PathBuf {
        self.root.join("jobs").join(job_id)
    }

    async fn write_record(&self, job: &EvaluationJob) -> Result<(), StoreError> {
        let dir = self.job_dir(&job.id);
        fs::create_dir_all(&dir).await?;
        let pretty = serde_json::to_string_pretty(job)?;
        fs::write(dir.join("job.json"), pretty).await?;
        Ok(())
    }
}

#[async_trait]
impl JobStore for FileJobStore {
    async fn create(&self, job: &EvaluationJob) -> Result<(), StoreError> {
        self.write_record(job).await?;
        info!("Store: created job {} ({})", job.id, job.status);
        Ok(())
    }

    async fn load(&self, job_id: &str) -> Result<Option<EvaluationJob>, StoreError> {
        let path = self.job_dir(job_id).join("job.json");
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, job: &mut EvaluationJob) -> Result<(), StoreError> {
        job.updated_at = Utc::now();
        self.write_record(job).await?;
        info!("Store: updated job {} ({})", job.id, job.status);
        Ok(())
    }

    async fn put_result(
        &self,
        job_id: &str,
        report: &EvaluationReport,
    ) -> Result<String, StoreError> {
        let dir = self.job_dir(job_id);
        fs::create_dir_all(&dir).await?;
        let pretty = serde_json::to_string_pretty(report)?;
        fs::write(dir.join("report.json"), pretty).await?;
        Ok(format!("jobs/{job_id}/report.json"))
    }

    async fn load_result(&self, job_id: &str) -> Result<Option<EvaluationReport>, StoreError> {
        let path = self.job_dir(job_id).join("report.json");
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put_upload(
        &self,
        job_id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, StoreError> {
        let dir = self.job_dir(job_id).join("uploads");
        fs::create_dir_all(&dir).await?;
        let path = dir.join(sanitize_file_name(file_name));
        fs::write(&path, bytes).await?;
        Ok(path)
    }
}

/// Strip path components and replace anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        "upload".to_string()
    } else {
        sanitized
    }
}
