//! Audio acquisition.
//!
//! Produces a normalized MP3 artifact from either a remote video URL
//! (via yt-dlp) or an uploaded media file (via ffmpeg). Artifacts are
//! named by millisecond timestamp inside the caller-provided directory
//! and are owned by the request that created them; this module never
//! deletes its own output.

use crate::error::{OppsumError, Result};
use crate::process::run_tool;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Produces audio artifacts for the pipelines.
///
/// Seam between the orchestrator and the external yt-dlp/ffmpeg
/// binaries; tests substitute an in-memory implementation.
#[async_trait]
pub trait AudioAcquirer: Send + Sync {
    /// Download the audio track of a remote video into `output_dir`.
    async fn download(&self, url: &str, output_dir: &Path) -> Result<PathBuf>;

    /// Transcode a media file into a normalized MP3 inside `output_dir`.
    async fn transcode(&self, input: &Path, output_dir: &Path) -> Result<PathBuf>;
}

/// Acquirer backed by the real yt-dlp and ffmpeg binaries.
pub struct CliAudioAcquirer;

#[async_trait]
impl AudioAcquirer for CliAudioAcquirer {
    async fn download(&self, url: &str, output_dir: &Path) -> Result<PathBuf> {
        download_audio(url, output_dir).await
    }

    async fn transcode(&self, input: &Path, output_dir: &Path) -> Result<PathBuf> {
        transcode_audio(input, output_dir).await
    }
}

/// Build a timestamp-named artifact path inside `dir`.
///
/// Millisecond resolution is the only collision guard; two requests
/// landing on the same tick would collide, matching the upstream
/// service's behavior.
pub fn temp_artifact_path(dir: &Path, ext: &str) -> PathBuf {
    dir.join(format!("{}.{}", chrono::Utc::now().timestamp_millis(), ext))
}

/// Download the audio track of a remote video as MP3.
///
/// Drives yt-dlp in extract-audio mode and verifies the artifact exists
/// afterwards; yt-dlp occasionally exits cleanly without producing a
/// file (e.g. members-only videos), so the existence check is load-bearing.
#[instrument(skip(output_dir), fields(url = %url))]
pub async fn download_audio(url: &str, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let target_path = temp_artifact_path(output_dir, "mp3");

    info!("Downloading audio from {}", url);

    let target = target_path.to_string_lossy().into_owned();
    let result = run_tool(
        "yt-dlp",
        &[
            "--extract-audio",
            "--audio-format",
            "mp3",
            "--audio-quality",
            "0",
            "--output",
            &target,
            "--no-playlist",
            "--no-warnings",
            url,
        ],
    )
    .await;

    match result {
        Ok(_) => {}
        Err(OppsumError::ToolFailed(msg)) => {
            return Err(OppsumError::Download(format!("yt-dlp failed: {msg}")));
        }
        Err(e) => return Err(e),
    }

    if !target_path.exists() {
        return Err(OppsumError::ArtifactMissing(format!(
            "audio file not found after download: {}",
            target_path.display()
        )));
    }

    Ok(target_path)
}

/// Transcode an arbitrary media file into MP3.
///
/// Used both as a format fix-up after download and to normalize uploaded
/// video containers into what the transcription service accepts.
#[instrument(skip_all, fields(input = %input.display()))]
pub async fn transcode_audio(input: &Path, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let target_path = temp_artifact_path(output_dir, "mp3");

    info!("Transcoding {} to MP3", input.display());

    let source = input.to_string_lossy().into_owned();
    let target = target_path.to_string_lossy().into_owned();
    let result = run_tool(
        "ffmpeg",
        &[
            "-i",
            &source,
            "-vn",
            "-acodec",
            "libmp3lame",
            "-y",
            "-loglevel",
            "error",
            &target,
        ],
    )
    .await;

    match result {
        Ok(_) => {}
        Err(OppsumError::ToolFailed(msg)) => {
            return Err(OppsumError::Transcode(format!("ffmpeg failed: {msg}")));
        }
        Err(e) => return Err(e),
    }

    if !target_path.exists() {
        return Err(OppsumError::ArtifactMissing(format!(
            "audio file not found after transcode: {}",
            target_path.display()
        )));
    }

    Ok(target_path)
}

/// Best-effort removal of a temporary artifact.
///
/// Deletion failures are logged and swallowed; a leaked temp file must
/// never turn a successful pipeline into an error response.
pub fn remove_artifact(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!("Failed to delete temporary file {}: {}", path.display(), e);
    }
}
