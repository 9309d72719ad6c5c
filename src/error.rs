//! Error types for Oppsum.

use thiserror::Error;

/// Library-level error type for Oppsum operations.
#[derive(Error, Debug)]
pub enum OppsumError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Audio download failed: {0}")]
    Download(String),

    #[error("Audio transcoding failed: {0}")]
    Transcode(String),

    #[error("Expected output file is missing: {0}")]
    ArtifactMissing(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Transcription timed out after {attempts} polls")]
    TranscriptionTimeout { attempts: u32 },

    #[error("Subtitle extraction failed: {0}")]
    Subtitle(String),

    #[error("Summarization failed: {0}")]
    Summarization(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl OppsumError {
    /// HTTP status code this error maps to when surfaced to a client.
    ///
    /// Missing/invalid request input and unsupported upload formats are the
    /// caller's fault (400); everything else is a pipeline failure (500).
    pub fn status_code(&self) -> u16 {
        match self {
            OppsumError::InvalidInput(_) | OppsumError::UnsupportedFormat(_) => 400,
            _ => 500,
        }
    }
}

/// Result type alias for Oppsum operations.
pub type Result<T> = std::result::Result<T, OppsumError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_400() {
        assert_eq!(OppsumError::InvalidInput("x".into()).status_code(), 400);
        assert_eq!(OppsumError::UnsupportedFormat("x".into()).status_code(), 400);
    }

    #[test]
    fn test_pipeline_errors_map_to_500() {
        assert_eq!(OppsumError::Download("x".into()).status_code(), 500);
        assert_eq!(OppsumError::Transcription("x".into()).status_code(), 500);
        assert_eq!(
            OppsumError::TranscriptionTimeout { attempts: 40 }.status_code(),
            500
        );
        assert_eq!(OppsumError::Summarization("x".into()).status_code(), 500);
    }
}
