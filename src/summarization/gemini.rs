//! Google Gemini summarization implementation.

use super::{build_summary_prompt, Summarizer, SummaryFile, SummaryLevel, SummaryResult};
use crate::config::SummarizationSettings;
use crate::error::{OppsumError, Result};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Gemini-backed summarizer using the generateContent REST API.
///
/// Every call is a single-turn request with an empty history. Inline
/// binary parts in the response are decoded and persisted under the
/// output directory.
pub struct GeminiSummarizer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    generation_config: GenerationConfig,
    output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

impl GeminiSummarizer {
    /// Create a summarizer from settings and an API key.
    pub fn new(settings: &SummarizationSettings, api_key: &str, output_dir: &Path) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: settings.gemini_base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: settings.gemini_model.clone(),
            generation_config: GenerationConfig {
                temperature: settings.temperature,
                top_p: settings.top_p,
                top_k: settings.top_k,
                max_output_tokens: settings.max_output_tokens,
                response_mime_type: "text/plain",
            },
            output_dir: output_dir.to_path_buf(),
        }
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    #[instrument(skip(self, text), fields(level = ?level, chars = text.len()))]
    async fn summarize(&self, text: &str, level: SummaryLevel) -> Result<SummaryResult> {
        let prompt = build_summary_prompt(text, level);

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: self.generation_config.clone(),
        };

        info!("Requesting summary from {}", self.model);

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent?key={}",
                self.base_url, self.model, self.api_key
            ))
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| OppsumError::Summarization(format!("Gemini request failed: {e}")))?;

        let body: GenerateContentResponse = response.json().await?;
        extract_result(&body, &self.output_dir)
    }
}

/// Pull the primary text and any inline binary parts out of a response.
fn extract_result(response: &GenerateContentResponse, output_dir: &Path) -> Result<SummaryResult> {
    let text = response
        .candidates
        .first()
        .map(|c| {
            c.content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<_>>()
                .join("")
        })
        .filter(|t| !t.is_empty())
        .ok_or_else(|| OppsumError::Summarization("empty response from Gemini".to_string()))?;

    let files = persist_inline_parts(response, output_dir);

    Ok(SummaryResult { text, files })
}

/// Decode and write inline binary payloads, named deterministically by
/// candidate and part index plus the declared media type.
///
/// Write failures are logged and the part is skipped; attachments are a
/// best-effort extra, never a reason to fail the summary.
fn persist_inline_parts(response: &GenerateContentResponse, output_dir: &Path) -> Vec<SummaryFile> {
    let mut files = Vec::new();

    for (candidate_index, candidate) in response.candidates.iter().enumerate() {
        for (part_index, part) in candidate.content.parts.iter().enumerate() {
            let Some(inline) = &part.inline_data else {
                continue;
            };

            let filename = format!(
                "output_{}_{}.{}",
                candidate_index,
                part_index,
                extension_for_media_type(&inline.mime_type)
            );
            let path = output_dir.join(&filename);

            let bytes = match base64::engine::general_purpose::STANDARD.decode(&inline.data) {
                Ok(b) => b,
                Err(e) => {
                    warn!("Skipping undecodable inline part {}: {}", filename, e);
                    continue;
                }
            };

            if let Err(e) = std::fs::write(&path, bytes) {
                warn!("Failed to write inline part {}: {}", path.display(), e);
                continue;
            }

            debug!("Wrote inline attachment to {}", path.display());
            files.push(SummaryFile { filename, path });
        }
    }

    files
}

/// Map a declared media type to a filename extension.
fn extension_for_media_type(media_type: &str) -> &str {
    match media_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "audio/mpeg" => "mp3",
        "audio/wav" => "wav",
        "video/mp4" => "mp4",
        "application/pdf" => "pdf",
        "application/json" => "json",
        "text/plain" => "txt",
        "text/markdown" => "md",
        "text/csv" => "csv",
        "text/html" => "html",
        _ => "bin",
    }
}
