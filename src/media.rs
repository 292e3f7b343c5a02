use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{info, warn};

use crate::types::{MediaKind, UploadedMedia};

/// What media preparation resolved for a job: at most one analyzable audio
/// artifact, a human-readable descriptor for the prompts, and any notes
/// about degraded steps. Preparation never fails hard.
#[derive(Debug)]
pub struct PreparedMedia {
    pub audio_path: Option<PathBuf>,
    pub descriptor: String,
    pub warnings: Vec<String>,
}

const NO_AUDIO: &str = "no audio available";

/// Pick "the" audio and video sources from the upload list.
/// Tie-break when several uploads share a kind: first by upload order.
pub fn select_sources(
    media: &[UploadedMedia],
) -> (Option<&UploadedMedia>, Option<&UploadedMedia>) {
    let audio = media.iter().find(|m| m.kind == MediaKind::Audio);
    let video = media.iter().find(|m| m.kind == MediaKind::Video);
    (audio, video)
}

/// Resolve a playable audio artifact for the job: the uploaded audio
/// directly, or the audio track extracted from the uploaded video.
pub async fn prepare(job_id: &str, media: &[UploadedMedia], work_dir: &Path) -> PreparedMedia {
    let (audio, video) = select_sources(media);
    let mut warnings = Vec::new();

    if let Some(audio) = audio {
        let descriptor = describe(audio, audio.size_bytes, "uploaded audio", &mut warnings).await;
        return PreparedMedia {
            audio_path: Some(audio.path.clone()),
            descriptor,
            warnings,
        };
    }

    if let Some(video) = video {
        let out_path = work_dir.join(format!("{job_id}.wav"));
        match extract_audio(&video.path, &out_path).await {
            Ok(()) => {
                info!(
                    "Media: extracted audio from {} to {}",
                    video.file_name,
                    out_path.display()
                );
                let size = tokio::fs::metadata(&out_path)
                    .await
                    .map(|m| m.len())
                    .unwrap_or(0);
                let descriptor =
                    describe(video, size, "audio extracted from video", &mut warnings).await;
                return PreparedMedia {
                    audio_path: Some(out_path),
                    descriptor,
                    warnings,
                };
            }
            Err(message) => {
                warn!("Media: audio extraction failed: {message}");
                warnings.push(message);
            }
        }
    }

    PreparedMedia {
        audio_path: None,
        descriptor: NO_AUDIO.to_string(),
        warnings,
    }
}

async fn describe(
    source: &UploadedMedia,
    size_bytes: u64,
    label: &str,
    warnings: &mut Vec<String>,
) -> String {
    match probe_duration(&source.path).await {
        Ok(seconds) => format!(
            "{label} \"{}\" ({size_bytes} bytes, {seconds:.1}s)",
            source.file_name
        ),
        Err(message) => {
            warnings.push(format!("Could not probe media duration: {message}"));
            format!("{label} \"{}\" ({size_bytes} bytes)", source.file_name)
        }
    }
}

/// ffmpeg extraction of a mono 16 kHz WAV track. A missing binary is a
/// recoverable failure, reported as an error string for the warning list.
async fn extract_audio(video_path: &Path, out_path: &Path) -> Result<(), String> {
    let output = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(video_path)
        .args(["-vn", "-ac", "1", "-ar", "16000"])
        .arg(out_path)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                "ffmpeg is not installed; skipping audio extraction from video".to_string()
            } else {
                format!("failed to run ffmpeg: {e}")
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: String = stderr.lines().last().unwrap_or("").to_string();
        return Err(format!("ffmpeg exited with {}: {tail}", output.status));
    }
    Ok(())
}

async fn probe_duration(path: &Path) -> Result<f64, String> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                "ffprobe is not installed".to_string()
            } else {
                format!("failed to run ffprobe: {e}")
            }
        })?;

    if !output.status.success() {
        return Err(format!("ffprobe exited with {}", output.status));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("unparseable ffprobe duration: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(kind: MediaKind, name: &str) -> UploadedMedia {
        UploadedMedia {
            kind,
            path: PathBuf::from(format!("/tmp/{name}")),
            mime_type: "application/octet-stream".to_string(),
            file_name: name.to_string(),
            size_bytes: 10,
        }
    }

    #[test]
    fn select_sources_takes_first_of_each_kind() {
        let uploads = vec![
            media(MediaKind::Other, "notes.txt"),
            media(MediaKind::Audio, "first.mp3"),
            media(MediaKind::Video, "talk.mp4"),
            media(MediaKind::Audio, "second.mp3"),
        ];
        let (audio, video) = select_sources(&uploads);
        assert_eq!(audio.unwrap().file_name, "first.mp3");
        assert_eq!(video.unwrap().file_name, "talk.mp4");
    }

    #[test]
    fn select_sources_handles_empty_list() {
        let (audio, video) = select_sources(&[]);
        assert!(audio.is_none());
        assert!(video.is_none());
    }

    #[tokio::test]
    async fn prepare_without_media_reports_no_audio() {
        let work_dir = std::env::temp_dir();
        let prepared = prepare("job-1", &[], &work_dir).await;
        assert!(prepared.audio_path.is_none());
        assert_eq!(prepared.descriptor, "no audio available");
        assert!(prepared.warnings.is_empty());
    }
}
