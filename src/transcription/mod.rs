//! Transcription module for Oppsum.
//!
//! Speech-to-text is delegated to a remote service (AssemblyAI): the
//! audio artifact is uploaded, a transcription job is created, and the
//! job is polled until it reaches a terminal state or the attempt
//! budget runs out.

mod assemblyai;

pub use assemblyai::{AssemblyAiApi, AssemblyAiTranscriber, TranscriptApi, TranscriptJob};

use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file and return the transcript text.
    ///
    /// The input artifact is not deleted; it belongs to the caller.
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}

/// Remote-side transcription job state, as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

/// Outcome of one bounded polling run.
///
/// Expressed as a tagged result rather than an error so the timeout path
/// is ordinary data flow, not exception control flow.
#[derive(Debug)]
pub enum PollOutcome {
    /// Job completed; carries the transcript text.
    Completed(String),
    /// Job reached the error state; carries the remote-reported reason.
    Failed(String),
    /// Attempt budget exhausted without a terminal state.
    TimedOut { attempts: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_deserializes_from_wire_values() {
        let s: JobStatus = serde_json::from_str("\"processing\"").unwrap();
        assert_eq!(s, JobStatus::Processing);
        let s: JobStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(s, JobStatus::Completed);
    }
}
