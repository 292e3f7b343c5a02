use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use pitch_coach::config::Config;
use pitch_coach::console;
use pitch_coach::runner::JobRunner;
use pitch_coach::store::FileJobStore;
use pitch_coach::types::{EvaluationRequest, MediaKind, TargetKind, UploadedMedia};

#[derive(Debug, Parser)]
#[command(name = "pitch_coach", about = "Presentation coaching pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate local files in one shot and print the report
    Run(SubmitArgs),
    /// Create a job, process it in the background, print the job id immediately
    Submit(SubmitArgs),
    /// Show a job record and, once completed, its report
    Status {
        /// Job identifier returned by submit
        job_id: String,
    },
}

#[derive(Debug, clap::Args)]
struct SubmitArgs {
    /// What to evaluate: full, pitch_deck, delivery, audio or video
    #[arg(long, default_value = "full")]
    target: String,

    /// Path to a plain-text slide deck export
    #[arg(long)]
    deck: Option<PathBuf>,

    /// Path to a caller-supplied transcript
    #[arg(long)]
    transcript: Option<PathBuf>,

    /// Audio/video attachments (repeatable)
    #[arg(long)]
    media: Vec<PathBuf>,

    /// Free-text context for the coach (audience, stakes, round)
    #[arg(long)]
    context: Option<String>,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter_layer).init();

    let config = Config::load()?;
    let store = Arc::new(FileJobStore::new(config.data_dir.clone()));
    let runner = Arc::new(JobRunner::new(config, store)?);

    match cli.command {
        Command::Run(args) => {
            let (request, media) = build_request(&args).await?;
            let job = runner.submit(request, media).await?;
            runner.run(&job.id).await?;
            match runner.status(&job.id).await? {
                Some((job, Some(report))) => {
                    console::display_job(&job);
                    console::display_report(&report);
                }
                Some((job, None)) => console::display_job(&job),
                None => bail!("job {} vanished from the store", job.id),
            }
        }
        Command::Submit(args) => {
            let (request, media) = build_request(&args).await?;
            let job = runner.submit(request, media).await?;
            console::display_submitted(&job);
            // The background task owns the job from here; keep the process
            // alive until it reaches a terminal state.
            runner.spawn(job.id.clone()).await?;
            tracing::info!("Job {} reached a terminal state", job.id);
        }
        Command::Status { job_id } => match runner.status(&job_id).await? {
            Some((job, report)) => {
                console::display_job(&job);
                if let Some(report) = report {
                    console::display_report(&report);
                }
            }
            None => bail!("no job with id {job_id}"),
        },
    }

    Ok(())
}

async fn build_request(args: &SubmitArgs) -> Result<(EvaluationRequest, Vec<UploadedMedia>)> {
    let target: TargetKind = args.target.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let deck_text = match &args.deck {
        Some(path) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read deck text from {}", path.display()))?,
        ),
        None => None,
    };
    let transcript = match &args.transcript {
        Some(path) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read transcript from {}", path.display()))?,
        ),
        None => None,
    };

    let mut media = Vec::with_capacity(args.media.len());
    for path in &args.media {
        media.push(media_from_path(path).await?);
    }

    let request = EvaluationRequest {
        target,
        context: args.context.clone(),
        deck_text,
        transcript,
        audio_summary: None,
        metadata: None,
    };
    Ok((request, media))
}

async fn media_from_path(path: &Path) -> Result<UploadedMedia> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("failed to stat media file {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    let (kind, mime_type) = classify(path);
    Ok(UploadedMedia {
        kind,
        path: path.to_path_buf(),
        mime_type: mime_type.to_string(),
        file_name,
        size_bytes: metadata.len(),
    })
}

fn classify(path: &Path) -> (MediaKind, &'static str) {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "mp4" => (MediaKind::Video, "video/mp4"),
        "mov" => (MediaKind::Video, "video/quicktime"),
        "webm" => (MediaKind::Video, "video/webm"),
        "mp3" => (MediaKind::Audio, "audio/mpeg"),
        "wav" => (MediaKind::Audio, "audio/wav"),
        "m4a" => (MediaKind::Audio, "audio/mp4"),
        "ogg" => (MediaKind::Audio, "audio/ogg"),
        _ => (MediaKind::Other, "application/octet-stream"),
    }
}
