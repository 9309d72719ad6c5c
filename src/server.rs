//! HTTP API server.
//!
//! JSON in/out except the two multipart upload routes. Missing required
//! fields are rejected with 400 before any process or network activity;
//! pipeline failures surface as 500 with an `error` field.

use crate::config::Settings;
use crate::error::{OppsumError, Result};
use crate::orchestrator::Pipeline;
use crate::summarization::{SummaryFile, SummaryLevel};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Shared application state.
pub struct AppState {
    pipeline: Pipeline,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }
}

/// Build the application router.
pub fn app(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/transcribe", post(transcribe))
        .route("/summarize-youtube", post(summarize_youtube))
        .route("/summarize", post(summarize))
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/transcribe-video",
            post(transcribe_video).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run(settings: &Settings, pipeline: Pipeline) -> anyhow::Result<()> {
    let max_upload_bytes = settings.server.max_upload_mb * 1024 * 1024;
    let state = Arc::new(AppState::new(pipeline));
    let router = app(state, max_upload_bytes);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct VideoRequest {
    #[serde(rename = "videoUrl")]
    video_url: Option<String>,
    level: Option<String>,
}

#[derive(Deserialize)]
struct SummarizeRequest {
    transcript: Option<String>,
    level: Option<String>,
}

#[derive(Serialize)]
struct TranscriptResponse {
    transcript: String,
}

#[derive(Serialize)]
struct YoutubeSummaryResponse {
    transcript: String,
    summary: String,
    source: crate::orchestrator::TranscriptSource,
}

#[derive(Serialize)]
struct SummaryResponse {
    summary: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    files: Vec<SummaryFile>,
}

#[derive(Serialize)]
struct DocumentSummaryResponse {
    text: String,
    #[serde(rename = "originalContent")]
    original_content: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(e: OppsumError) -> Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse { error: e.to_string() })).into_response()
}

fn missing_field(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn transcribe(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VideoRequest>,
) -> Response {
    let Some(video_url) = req.video_url else {
        return missing_field("No video URL provided");
    };

    match state.pipeline.transcribe_youtube(&video_url).await {
        Ok(transcript) => Json(TranscriptResponse { transcript }).into_response(),
        Err(e) => error_response(e),
    }
}

async fn summarize_youtube(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VideoRequest>,
) -> Response {
    let Some(video_url) = req.video_url else {
        return missing_field("No video URL provided");
    };
    let level = SummaryLevel::parse(req.level.as_deref());

    match state.pipeline.summarize_youtube(&video_url, level).await {
        Ok(result) => Json(YoutubeSummaryResponse {
            transcript: result.transcript,
            summary: result.summary,
            source: result.source,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn summarize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SummarizeRequest>,
) -> Response {
    let Some(transcript) = req.transcript else {
        return missing_field("No transcript provided");
    };
    let level = SummaryLevel::parse(req.level.as_deref());

    match state.pipeline.summarize_text(&transcript, level).await {
        Ok(result) => Json(SummaryResponse {
            summary: result.text,
            files: result.files,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn upload(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let parts = match read_upload(multipart, "file", state.pipeline.uploads_dir()).await {
        Ok(parts) => parts,
        Err(response) => return response,
    };
    let level = SummaryLevel::parse(parts.level.as_deref());

    match state
        .pipeline
        .summarize_document(&parts.path, parts.content_type.as_deref(), level)
        .await
    {
        Ok(result) => Json(DocumentSummaryResponse {
            text: result.text,
            original_content: result.original_content,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn transcribe_video(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let parts = match read_upload(multipart, "video", state.pipeline.uploads_dir()).await {
        Ok(parts) => parts,
        Err(response) => return response,
    };

    match state.pipeline.transcribe_upload(&parts.path).await {
        Ok(transcript) => Json(TranscriptResponse { transcript }).into_response(),
        Err(e) => error_response(e),
    }
}

// === Multipart handling ===

/// An upload spooled to disk plus the request metadata that came with it.
struct SpooledUpload {
    path: PathBuf,
    content_type: Option<String>,
    level: Option<String>,
}

/// Read a multipart request, spooling the named file field into the
/// uploads directory. The spooled file is owned by the pipeline from
/// here on; it deletes it on every exit path.
async fn read_upload(
    mut multipart: Multipart,
    file_field: &str,
    uploads_dir: &std::path::Path,
) -> std::result::Result<SpooledUpload, Response> {
    let mut spooled: Option<(PathBuf, Option<String>)> = None;
    let mut level: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(missing_field(&format!("Malformed multipart request: {e}")));
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(name) if name == file_field => {
                let content_type = field.content_type().map(str::to_string);
                let extension = field
                    .file_name()
                    .and_then(|f| std::path::Path::new(f).extension())
                    .and_then(|e| e.to_str())
                    .unwrap_or("bin")
                    .to_string();

                let bytes = match field.bytes().await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        return Err(missing_field(&format!("Failed to read upload: {e}")));
                    }
                };

                let path = match spool_upload(uploads_dir, &extension, &bytes).await {
                    Ok(path) => path,
                    Err(e) => return Err(error_response(e)),
                };
                spooled = Some((path, content_type));
            }
            Some("level") => {
                level = field.text().await.ok();
            }
            _ => {}
        }
    }

    let Some((path, content_type)) = spooled else {
        let what = if file_field == "video" { "video file" } else { "file" };
        return Err(missing_field(&format!("No {} uploaded", what)));
    };

    Ok(SpooledUpload {
        path,
        content_type,
        level,
    })
}

/// Write upload bytes to a timestamp-named file under the uploads dir.
async fn spool_upload(uploads_dir: &std::path::Path, extension: &str, bytes: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(uploads_dir).await?;
    let path = crate::audio::temp_artifact_path(uploads_dir, extension);
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}
