//! Subtitle extraction.
//!
//! Pulls pre-existing (auto-generated) captions for a video instead of
//! running speech-to-text. Trades accuracy and availability for speed:
//! no audio download, no transcoding, no remote transcription round-trip.

use crate::audio::remove_artifact;
use crate::error::{OppsumError, Result};
use crate::process::run_tool;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{info, instrument};

/// Extract captions for a video URL and return them as plain text.
///
/// Drives yt-dlp in captions-only mode, reads the first resulting VTT
/// file as the transcript, and deletes every caption file the run
/// produced (best effort) before returning. yt-dlp can emit several
/// language variants (`en`, `en-US`, `en-orig`) for one video, so
/// cleanup covers all of them on every exit path.
#[instrument(skip(work_dir), fields(url = %url))]
pub async fn extract_subtitles(url: &str, work_dir: &Path) -> Result<String> {
    std::fs::create_dir_all(work_dir)?;

    let stem = work_dir.join(chrono::Utc::now().timestamp_millis().to_string());
    let output_template = stem.to_string_lossy().into_owned();

    info!("Extracting captions from {}", url);

    let result = run_tool(
        "yt-dlp",
        &[
            "--skip-download",
            "--write-auto-subs",
            "--write-subs",
            "--sub-format",
            "vtt",
            "--sub-langs",
            "en.*",
            "--no-playlist",
            "--no-warnings",
            "--output",
            &output_template,
            url,
        ],
    )
    .await;

    match result {
        Ok(_) => {}
        Err(OppsumError::ToolFailed(msg)) => {
            return Err(OppsumError::Subtitle(format!("yt-dlp failed: {msg}")));
        }
        Err(e) => return Err(e),
    }

    let caption_files = find_caption_files(work_dir, &stem)?;

    // Read one variant, then delete them all before acting on the read
    // result so a read failure cannot leak the remaining files.
    let raw = std::fs::read_to_string(&caption_files[0]);
    for file in &caption_files {
        remove_artifact(file);
    }
    let raw = raw?;

    let text = vtt_to_text(&raw);
    if text.is_empty() {
        return Err(OppsumError::Subtitle(
            "caption file contained no text".to_string(),
        ));
    }

    Ok(text)
}

/// Locate every caption file yt-dlp produced for the given output stem.
fn find_caption_files(dir: &Path, stem: &Path) -> Result<Vec<PathBuf>> {
    let prefix = stem
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    let mut files = Vec::new();
    let entries = std::fs::read_dir(dir)?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(prefix) && name.ends_with(".vtt") {
            files.push(entry.path());
        }
    }

    if files.is_empty() {
        return Err(OppsumError::Subtitle(
            "no caption file produced; the video may have no subtitles".to_string(),
        ));
    }

    files.sort();
    Ok(files)
}

static CUE_TIMING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{2}:)?\d{2}:\d{2}[.,]\d{3}\s*-->").expect("static regex")
});
static MARKUP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static regex"));

/// Reduce a WebVTT document to plain transcript text.
///
/// Drops the header, cue identifiers, timing lines, and inline markup,
/// then collapses consecutive duplicate lines (auto-captions repeat each
/// line across overlapping cues).
pub fn vtt_to_text(vtt: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in vtt.lines() {
        let line = line.trim();
        if line.is_empty()
            || line.starts_with("WEBVTT")
            || line.starts_with("Kind:")
            || line.starts_with("Language:")
            || line.starts_with("NOTE")
            || CUE_TIMING.is_match(line)
        {
            continue;
        }

        let cleaned = MARKUP_TAG.replace_all(line, "").trim().to_string();
        if cleaned.is_empty() {
            continue;
        }

        if lines.last().map(|l| l.as_str()) != Some(cleaned.as_str()) {
            lines.push(cleaned);
        }
    }

    lines.join(" ")
}
