//! Summarization module for Oppsum.
//!
//! Text summarization is delegated to a remote generation service. All
//! backends share one prompt-construction contract; each call is a fresh
//! single-turn session with no conversation history.

mod gemini;
mod openai;

pub use gemini::GeminiSummarizer;
pub use openai::OpenAiSummarizer;

use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;

/// Requested summary detail level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryLevel {
    /// Very short and concise.
    Core,
    /// A detailed prose summary.
    Concise,
    /// Bullet points (the default).
    #[default]
    Detailed,
}

impl SummaryLevel {
    /// Parse a level from an optional request field.
    ///
    /// Anything missing or unrecognized falls back to `Detailed`,
    /// matching the permissive behavior clients already rely on.
    pub fn parse(level: Option<&str>) -> Self {
        match level {
            Some("core") => SummaryLevel::Core,
            Some("concise") => SummaryLevel::Concise,
            _ => SummaryLevel::Detailed,
        }
    }

    /// The level-specific instruction appended to the prompt.
    fn instruction(self) -> &'static str {
        match self {
            SummaryLevel::Core => "Make the summary very short and concise",
            SummaryLevel::Concise => "Make a detailed summary",
            SummaryLevel::Detailed => "Make the summary in bullet points",
        }
    }
}

/// Build the single-turn summarization directive.
///
/// The raw text is embedded directly; exactly one level instruction is
/// appended.
pub fn build_summary_prompt(text: &str, level: SummaryLevel) -> String {
    format!(
        "Provide a concise summary of the following text only, ensuring the output \
         contains only the summary and no extra introductory phrases: {}. {}",
        text,
        level.instruction()
    )
}

/// A binary attachment returned inline by the generation service and
/// persisted to disk.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryFile {
    pub filename: String,
    pub path: PathBuf,
}

/// Result of one summarization call.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryResult {
    /// The primary text response.
    pub text: String,
    /// Inline binary payloads, if the service returned any.
    pub files: Vec<SummaryFile>,
}

/// Trait for summarization services.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `text` at the requested detail level.
    async fn summarize(&self, text: &str, level: SummaryLevel) -> Result<SummaryResult>;
}
