//! AssemblyAI transcription implementation.

use super::{JobStatus, PollOutcome, Transcriber};
use crate::error::{OppsumError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, instrument};

/// A transcription job as reported by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptJob {
    pub id: String,
    pub status: JobStatus,
    /// Transcript text; present once the job completes.
    pub text: Option<String>,
    /// Failure reason; present when the job errors.
    pub error: Option<String>,
}

/// The remote transcription surface: binary ingestion, job creation,
/// and job status retrieval.
///
/// Split out as a trait so the polling logic can be exercised against an
/// in-memory fake.
#[async_trait]
pub trait TranscriptApi: Send + Sync {
    /// Upload an audio file; returns an opaque resource URL.
    async fn upload(&self, audio_path: &Path) -> Result<String>;

    /// Create a transcription job for an uploaded resource; returns the job id.
    async fn submit(&self, audio_url: &str) -> Result<String>;

    /// Fetch the current state of a job.
    async fn fetch(&self, job_id: &str) -> Result<TranscriptJob>;
}

/// HTTP client for the AssemblyAI v2 REST API.
pub struct AssemblyAiApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AssemblyAiApi {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[async_trait]
impl TranscriptApi for AssemblyAiApi {
    async fn upload(&self, audio_path: &Path) -> Result<String> {
        // Stream the file instead of buffering it; audio artifacts can
        // run to hundreds of megabytes.
        let file = tokio::fs::File::open(audio_path).await?;
        let size = file.metadata().await?.len();
        debug!("Uploading {} bytes of audio", size);

        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .header("authorization", &self.api_key)
            .header("content-type", "application/octet-stream")
            .body(reqwest::Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| OppsumError::Transcription(format!("audio upload rejected: {e}")))?;

        let body: UploadResponse = response.json().await?;
        Ok(body.upload_url)
    }

    async fn submit(&self, audio_url: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/transcript", self.base_url))
            .header("authorization", &self.api_key)
            .json(&serde_json::json!({ "audio_url": audio_url }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| OppsumError::Transcription(format!("job creation rejected: {e}")))?;

        let job: TranscriptJob = response.json().await?;
        debug!("Created transcription job {}", job.id);
        Ok(job.id)
    }

    async fn fetch(&self, job_id: &str) -> Result<TranscriptJob> {
        let response = self
            .client
            .get(format!("{}/transcript/{}", self.base_url, job_id))
            .header("authorization", &self.api_key)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| OppsumError::Transcription(format!("status poll rejected: {e}")))?;

        Ok(response.json().await?)
    }
}

/// AssemblyAI-backed transcriber: upload, submit, poll.
pub struct AssemblyAiTranscriber {
    api: Arc<dyn TranscriptApi>,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl AssemblyAiTranscriber {
    /// Create a transcriber talking to the real service.
    pub fn new(
        base_url: &str,
        api_key: &str,
        poll_interval: Duration,
        max_poll_attempts: u32,
    ) -> Self {
        Self::with_api(
            Arc::new(AssemblyAiApi::new(base_url, api_key)),
            poll_interval,
            max_poll_attempts,
        )
    }

    /// Create a transcriber over a custom API surface (used by tests).
    pub fn with_api(
        api: Arc<dyn TranscriptApi>,
        poll_interval: Duration,
        max_poll_attempts: u32,
    ) -> Self {
        Self {
            api,
            poll_interval,
            max_poll_attempts,
        }
    }

    /// Poll a job at a fixed interval until a terminal state or the
    /// attempt budget runs out.
    ///
    /// Each attempt is exactly one status fetch; no fetch happens after a
    /// terminal state is observed.
    async fn poll_until_terminal(&self, job_id: &str) -> Result<PollOutcome> {
        for attempt in 1..=self.max_poll_attempts {
            let job = self.api.fetch(job_id).await?;
            debug!("Poll {}: job {} is {:?}", attempt, job_id, job.status);

            match job.status {
                JobStatus::Completed => {
                    return Ok(PollOutcome::Completed(job.text.unwrap_or_default()));
                }
                JobStatus::Error => {
                    return Ok(PollOutcome::Failed(
                        job.error.unwrap_or_else(|| "unknown remote error".to_string()),
                    ));
                }
                JobStatus::Queued | JobStatus::Processing => {
                    if attempt < self.max_poll_attempts {
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
            }
        }

        Ok(PollOutcome::TimedOut {
            attempts: self.max_poll_attempts,
        })
    }
}

#[async_trait]
impl Transcriber for AssemblyAiTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        info!("Uploading audio for transcription");
        let audio_url = self.api.upload(audio_path).await?;

        let job_id = self.api.submit(&audio_url).await?;
        info!("Transcription job {} submitted, polling", job_id);

        match self.poll_until_terminal(&job_id).await? {
            PollOutcome::Completed(text) => {
                info!("Transcription complete ({} chars)", text.len());
                Ok(text)
            }
            PollOutcome::Failed(reason) => Err(OppsumError::Transcription(reason)),
            PollOutcome::TimedOut { attempts } => {
                Err(OppsumError::TranscriptionTimeout { attempts })
            }
        }
    }
}
