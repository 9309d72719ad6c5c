//! Pipeline orchestrator for Oppsum.
//!
//! Composes audio acquisition, transcription, subtitle extraction, and
//! summarization into the request pipelines the HTTP surface exposes.
//! Each pipeline instance owns its temporary artifacts and deletes them
//! on every exit path, success or failure.

use crate::audio::{remove_artifact, AudioAcquirer, CliAudioAcquirer};
use crate::config::{Credentials, Settings, SummarizationProvider};
use crate::document::extract_text;
use crate::error::{OppsumError, Result};
use crate::subtitles::extract_subtitles;
use crate::summarization::{
    GeminiSummarizer, OpenAiSummarizer, Summarizer, SummaryLevel, SummaryResult,
};
use crate::transcription::{AssemblyAiTranscriber, Transcriber};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Where a YouTube transcript came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptSource {
    /// Pre-existing captions pulled without transcoding or transcription.
    Subtitles,
    /// Full download, transcode, and remote transcription round-trip.
    Audio,
}

/// Result of the YouTube summarization pipeline.
#[derive(Debug, Clone)]
pub struct YoutubeSummary {
    pub transcript: String,
    pub summary: String,
    pub source: TranscriptSource,
}

/// Result of the document summarization pipeline.
#[derive(Debug, Clone)]
pub struct DocumentSummary {
    pub text: String,
    pub original_content: String,
}

/// The main pipeline orchestrator.
pub struct Pipeline {
    acquirer: Arc<dyn AudioAcquirer>,
    transcriber: Arc<dyn Transcriber>,
    summarizer: Arc<dyn Summarizer>,
    audio_dir: PathBuf,
    uploads_dir: PathBuf,
    prefer_subtitles: bool,
}

impl Pipeline {
    /// Wire up the real backends from settings and credentials.
    pub fn new(settings: &Settings, credentials: &Credentials) -> Result<Self> {
        let transcriber: Arc<dyn Transcriber> = Arc::new(AssemblyAiTranscriber::new(
            &settings.transcription.base_url,
            &credentials.assemblyai_api_key,
            Duration::from_secs(settings.transcription.poll_interval_seconds),
            settings.transcription.max_poll_attempts,
        ));

        let summarizer: Arc<dyn Summarizer> = match settings.summarization.provider {
            SummarizationProvider::Gemini => {
                let api_key = credentials.gemini_api_key.as_deref().ok_or_else(|| {
                    OppsumError::Config("Gemini provider selected but no API key".to_string())
                })?;
                info!("Using Gemini summarization ({})", settings.summarization.gemini_model);
                Arc::new(GeminiSummarizer::new(
                    &settings.summarization,
                    api_key,
                    &settings.uploads_dir(),
                ))
            }
            SummarizationProvider::OpenAi => {
                info!("Using OpenAI summarization ({})", settings.summarization.openai_model);
                Arc::new(OpenAiSummarizer::new(&settings.summarization))
            }
        };

        let audio_dir = settings.audio_dir();
        let uploads_dir = settings.uploads_dir();
        std::fs::create_dir_all(&audio_dir)?;
        std::fs::create_dir_all(&uploads_dir)?;

        Ok(Self {
            acquirer: Arc::new(CliAudioAcquirer),
            transcriber,
            summarizer,
            audio_dir,
            uploads_dir,
            prefer_subtitles: settings.transcription.prefer_subtitles,
        })
    }

    /// Create a pipeline with custom components (used by tests).
    pub fn with_components(
        acquirer: Arc<dyn AudioAcquirer>,
        transcriber: Arc<dyn Transcriber>,
        summarizer: Arc<dyn Summarizer>,
        audio_dir: PathBuf,
        uploads_dir: PathBuf,
        prefer_subtitles: bool,
    ) -> Self {
        Self {
            acquirer,
            transcriber,
            summarizer,
            audio_dir,
            uploads_dir,
            prefer_subtitles,
        }
    }

    /// Get the directory uploaded files are spooled into.
    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Transcribe a remote video: download its audio track, run it
    /// through the transcription service, delete the artifact.
    #[instrument(skip(self), fields(url = %video_url))]
    pub async fn transcribe_youtube(&self, video_url: &str) -> Result<String> {
        validate_url(video_url)?;

        let audio = self.acquirer.download(video_url, &self.audio_dir).await?;
        let result = self.transcriber.transcribe(&audio).await;
        remove_artifact(&audio);
        result
    }

    /// Summarize a remote video end to end.
    ///
    /// Tries caption extraction first when configured; any caption
    /// failure falls back to the full audio round-trip.
    #[instrument(skip(self), fields(url = %video_url, level = ?level))]
    pub async fn summarize_youtube(
        &self,
        video_url: &str,
        level: SummaryLevel,
    ) -> Result<YoutubeSummary> {
        validate_url(video_url)?;

        let (transcript, source) = if self.prefer_subtitles {
            match extract_subtitles(video_url, &self.audio_dir).await {
                Ok(text) => (text, TranscriptSource::Subtitles),
                Err(e) => {
                    warn!("Caption extraction failed, falling back to audio: {}", e);
                    (
                        self.transcript_via_audio(video_url).await?,
                        TranscriptSource::Audio,
                    )
                }
            }
        } else {
            (
                self.transcript_via_audio(video_url).await?,
                TranscriptSource::Audio,
            )
        };

        let summary = self.summarizer.summarize(&transcript, level).await?;

        Ok(YoutubeSummary {
            transcript,
            summary: summary.text,
            source,
        })
    }

    /// Summarize raw transcript text.
    #[instrument(skip(self, text), fields(level = ?level, chars = text.len()))]
    pub async fn summarize_text(&self, text: &str, level: SummaryLevel) -> Result<SummaryResult> {
        self.summarizer.summarize(text, level).await
    }

    /// Summarize an uploaded document. The upload is deleted whether or
    /// not extraction or summarization succeeds.
    #[instrument(skip(self), fields(path = %upload_path.display(), level = ?level))]
    pub async fn summarize_document(
        &self,
        upload_path: &Path,
        content_type: Option<&str>,
        level: SummaryLevel,
    ) -> Result<DocumentSummary> {
        let extracted = match extract_text(upload_path, content_type).await {
            Ok(text) => text,
            Err(e) => {
                remove_artifact(upload_path);
                return Err(e);
            }
        };

        let summary = self.summarizer.summarize(&extracted, level).await;
        remove_artifact(upload_path);
        let summary = summary?;

        Ok(DocumentSummary {
            text: summary.text,
            original_content: extracted,
        })
    }

    /// Transcribe an uploaded video: normalize it to MP3, run it through
    /// the transcription service, delete both artifacts.
    #[instrument(skip(self), fields(path = %upload_path.display()))]
    pub async fn transcribe_upload(&self, upload_path: &Path) -> Result<String> {
        let audio = self.acquirer.transcode(upload_path, &self.audio_dir).await;
        remove_artifact(upload_path);
        let audio = audio?;

        let result = self.transcriber.transcribe(&audio).await;
        remove_artifact(&audio);
        result
    }

    /// Download, fix up, and transcribe the audio track of a video.
    async fn transcript_via_audio(&self, video_url: &str) -> Result<String> {
        let downloaded = self.acquirer.download(video_url, &self.audio_dir).await?;

        // Format fix-up: the extracted audio is re-encoded once more
        // before upload, as some extractions carry container quirks the
        // transcription service rejects.
        let fixed = self.acquirer.transcode(&downloaded, &self.audio_dir).await;
        remove_artifact(&downloaded);
        let fixed = fixed?;

        let result = self.transcriber.transcribe(&fixed).await;
        remove_artifact(&fixed);
        result
    }
}

/// Reject video URLs that do not parse as absolute URLs before any
/// external process is spawned.
fn validate_url(video_url: &str) -> Result<()> {
    url::Url::parse(video_url)
        .map_err(|e| OppsumError::InvalidInput(format!("invalid video URL: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarization::{build_summary_prompt, SummaryFile};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Acquirer that writes real files so cleanup can be observed.
    struct MockAcquirer {
        fail_transcode: bool,
        created: Mutex<Vec<PathBuf>>,
    }

    impl MockAcquirer {
        fn ok() -> Self {
            Self {
                fail_transcode: false,
                created: Mutex::new(Vec::new()),
            }
        }

        fn failing_transcode() -> Self {
            Self {
                fail_transcode: true,
                created: Mutex::new(Vec::new()),
            }
        }

        fn produce(&self, output_dir: &Path, prefix: &str) -> Result<PathBuf> {
            let mut created = self.created.lock().unwrap();
            let path = output_dir.join(format!("{}-{}.mp3", prefix, created.len()));
            std::fs::write(&path, b"mp3")?;
            created.push(path.clone());
            Ok(path)
        }

        fn created(&self) -> Vec<PathBuf> {
            self.created.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AudioAcquirer for MockAcquirer {
        async fn download(&self, _url: &str, output_dir: &Path) -> Result<PathBuf> {
            self.produce(output_dir, "downloaded")
        }

        async fn transcode(&self, _input: &Path, output_dir: &Path) -> Result<PathBuf> {
            if self.fail_transcode {
                return Err(OppsumError::Transcode("ffmpeg failed: scripted".to_string()));
            }
            self.produce(output_dir, "transcoded")
        }
    }

    struct MockTranscriber {
        response: std::result::Result<String, String>,
        calls: AtomicU32,
    }

    impl MockTranscriber {
        fn ok(text: &str) -> Self {
            Self {
                response: Ok(text.to_string()),
                calls: AtomicU32::new(0),
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                response: Err(reason.to_string()),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Transcriber for MockTranscriber {
        async fn transcribe(&self, _audio_path: &Path) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response
                .clone()
                .map_err(OppsumError::Transcription)
        }
    }

    struct MockSummarizer {
        response: std::result::Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl MockSummarizer {
        fn ok(text: &str) -> Self {
            Self {
                response: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                response: Err(reason.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Summarizer for MockSummarizer {
        async fn summarize(&self, text: &str, level: SummaryLevel) -> Result<SummaryResult> {
            self.prompts
                .lock()
                .unwrap()
                .push(build_summary_prompt(text, level));
            match &self.response {
                Ok(text) => Ok(SummaryResult {
                    text: text.clone(),
                    files: Vec::<SummaryFile>::new(),
                }),
                Err(reason) => Err(OppsumError::Summarization(reason.clone())),
            }
        }
    }

    fn pipeline_with(
        transcriber: Arc<MockTranscriber>,
        summarizer: Arc<MockSummarizer>,
        dir: &Path,
    ) -> Pipeline {
        pipeline_with_acquirer(Arc::new(MockAcquirer::ok()), transcriber, summarizer, dir)
    }

    fn pipeline_with_acquirer(
        acquirer: Arc<MockAcquirer>,
        transcriber: Arc<MockTranscriber>,
        summarizer: Arc<MockSummarizer>,
        dir: &Path,
    ) -> Pipeline {
        Pipeline::with_components(
            acquirer,
            transcriber,
            summarizer,
            dir.to_path_buf(),
            dir.to_path_buf(),
            false,
        )
    }

    fn assert_all_deleted(paths: &[PathBuf]) {
        for path in paths {
            assert!(!path.exists(), "artifact leaked: {}", path.display());
        }
    }

    #[tokio::test]
    async fn test_summarize_text_builds_level_prompt_once() {
        let dir = tempfile::tempdir().unwrap();
        let summarizer = Arc::new(MockSummarizer::ok("stubbed short text"));
        let pipeline = pipeline_with(
            Arc::new(MockTranscriber::ok("unused")),
            summarizer.clone(),
            dir.path(),
        );

        let result = pipeline
            .summarize_text("The quick brown fox...", SummaryLevel::Core)
            .await
            .unwrap();

        assert_eq!(result.text, "stubbed short text");
        let prompts = summarizer.prompts();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].matches("very short and concise").count(), 1);
        assert!(prompts[0].contains("The quick brown fox..."));
    }

    #[tokio::test]
    async fn test_summarize_document_deletes_upload_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let upload = dir.path().join("1700000000001.txt");
        std::fs::write(&upload, "document body to summarize").unwrap();

        let summarizer = Arc::new(MockSummarizer::ok("summary"));
        let pipeline = pipeline_with(
            Arc::new(MockTranscriber::ok("unused")),
            summarizer,
            dir.path(),
        );

        let result = pipeline
            .summarize_document(&upload, Some("text/plain"), SummaryLevel::Concise)
            .await
            .unwrap();

        assert_eq!(result.text, "summary");
        assert_eq!(result.original_content, "document body to summarize");
        assert!(!upload.exists(), "upload must be deleted after success");
    }

    #[tokio::test]
    async fn test_summarize_document_deletes_upload_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let upload = dir.path().join("1700000000002.txt");
        std::fs::write(&upload, "document body").unwrap();

        let pipeline = pipeline_with(
            Arc::new(MockTranscriber::ok("unused")),
            Arc::new(MockSummarizer::failing("backend down")),
            dir.path(),
        );

        let err = pipeline
            .summarize_document(&upload, Some("text/plain"), SummaryLevel::Detailed)
            .await
            .unwrap_err();

        assert!(matches!(err, OppsumError::Summarization(_)));
        assert!(!upload.exists(), "upload must be deleted after failure");
    }

    #[tokio::test]
    async fn test_summarize_document_unsupported_type_skips_summarizer() {
        let dir = tempfile::tempdir().unwrap();
        let upload = dir.path().join("1700000000003.zip");
        std::fs::write(&upload, b"PK").unwrap();

        let summarizer = Arc::new(MockSummarizer::ok("should not be called"));
        let pipeline = pipeline_with(
            Arc::new(MockTranscriber::ok("unused")),
            summarizer.clone(),
            dir.path(),
        );

        let err = pipeline
            .summarize_document(&upload, Some("application/zip"), SummaryLevel::Detailed)
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 400);
        assert!(summarizer.prompts().is_empty(), "no summarization attempted");
        assert!(!upload.exists(), "upload deleted even when rejected");
    }

    #[tokio::test]
    async fn test_invalid_url_rejected_before_any_work() {
        let dir = tempfile::tempdir().unwrap();
        let transcriber = Arc::new(MockTranscriber::ok("unused"));
        let pipeline = pipeline_with(
            transcriber.clone(),
            Arc::new(MockSummarizer::ok("unused")),
            dir.path(),
        );

        let err = pipeline.transcribe_youtube("not a url").await.unwrap_err();
        assert!(matches!(err, OppsumError::InvalidInput(_)));
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transcribe_upload_deletes_both_artifacts_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let upload = dir.path().join("1700000000004.webm");
        std::fs::write(&upload, b"video").unwrap();

        let acquirer = Arc::new(MockAcquirer::ok());
        let pipeline = pipeline_with_acquirer(
            acquirer.clone(),
            Arc::new(MockTranscriber::ok("spoken words")),
            Arc::new(MockSummarizer::ok("unused")),
            dir.path(),
        );

        let transcript = pipeline.transcribe_upload(&upload).await.unwrap();

        assert_eq!(transcript, "spoken words");
        assert!(!upload.exists(), "upload must be deleted after success");
        assert_all_deleted(&acquirer.created());
    }

    #[tokio::test]
    async fn test_transcribe_upload_deletes_artifacts_when_transcription_fails() {
        let dir = tempfile::tempdir().unwrap();
        let upload = dir.path().join("1700000000005.webm");
        std::fs::write(&upload, b"video").unwrap();

        let acquirer = Arc::new(MockAcquirer::ok());
        let pipeline = pipeline_with_acquirer(
            acquirer.clone(),
            Arc::new(MockTranscriber::failing("backend down")),
            Arc::new(MockSummarizer::ok("unused")),
            dir.path(),
        );

        let err = pipeline.transcribe_upload(&upload).await.unwrap_err();

        assert!(matches!(err, OppsumError::Transcription(_)));
        assert!(!upload.exists(), "upload must be deleted after failure");
        assert_all_deleted(&acquirer.created());
    }

    #[tokio::test]
    async fn test_transcribe_upload_deletes_upload_when_transcode_fails() {
        let dir = tempfile::tempdir().unwrap();
        let upload = dir.path().join("1700000000006.webm");
        std::fs::write(&upload, b"video").unwrap();

        let transcriber = Arc::new(MockTranscriber::ok("unused"));
        let pipeline = pipeline_with_acquirer(
            Arc::new(MockAcquirer::failing_transcode()),
            transcriber.clone(),
            Arc::new(MockSummarizer::ok("unused")),
            dir.path(),
        );

        let err = pipeline.transcribe_upload(&upload).await.unwrap_err();

        assert!(matches!(err, OppsumError::Transcode(_)));
        assert!(!upload.exists(), "upload must be deleted after failure");
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_summarize_youtube_audio_path_deletes_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let acquirer = Arc::new(MockAcquirer::ok());
        let summarizer = Arc::new(MockSummarizer::ok("a summary"));
        let pipeline = pipeline_with_acquirer(
            acquirer.clone(),
            Arc::new(MockTranscriber::ok("spoken words")),
            summarizer.clone(),
            dir.path(),
        );

        let result = pipeline
            .summarize_youtube("https://example.com/watch?v=abc", SummaryLevel::Detailed)
            .await
            .unwrap();

        assert_eq!(result.transcript, "spoken words");
        assert_eq!(result.summary, "a summary");
        assert_eq!(result.source, TranscriptSource::Audio);
        // Both the downloaded file and the fix-up transcode are gone.
        assert_eq!(acquirer.created().len(), 2);
        assert_all_deleted(&acquirer.created());
    }

    #[tokio::test]
    async fn test_summarize_youtube_deletes_artifacts_when_transcription_fails() {
        let dir = tempfile::tempdir().unwrap();
        let acquirer = Arc::new(MockAcquirer::ok());
        let summarizer = Arc::new(MockSummarizer::ok("unused"));
        let pipeline = pipeline_with_acquirer(
            acquirer.clone(),
            Arc::new(MockTranscriber::failing("backend down")),
            summarizer.clone(),
            dir.path(),
        );

        let err = pipeline
            .summarize_youtube("https://example.com/watch?v=abc", SummaryLevel::Detailed)
            .await
            .unwrap_err();

        assert!(matches!(err, OppsumError::Transcription(_)));
        assert!(summarizer.prompts().is_empty(), "no summarization attempted");
        assert_all_deleted(&acquirer.created());
    }
}
