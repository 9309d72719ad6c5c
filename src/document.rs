//! Uploaded document text extraction.
//!
//! PDF extraction is delegated to the pdftotext CLI; everything textual
//! is read directly. Unrecognized media types are rejected before any
//! summarization work happens.

use crate::error::{OppsumError, Result};
use crate::process::run_tool;
use std::path::Path;
use tracing::{info, instrument};

/// Extract plain text from an uploaded document.
///
/// `content_type` is the media type the client declared for the upload.
#[instrument(skip_all, fields(path = %path.display(), content_type = content_type.unwrap_or("none")))]
pub async fn extract_text(path: &Path, content_type: Option<&str>) -> Result<String> {
    match content_type {
        Some("application/pdf") => extract_pdf_text(path).await,
        Some(ct) if ct.starts_with("text/") => {
            info!("Reading upload as plain text");
            Ok(tokio::fs::read_to_string(path).await?)
        }
        Some(ct) => Err(OppsumError::UnsupportedFormat(ct.to_string())),
        None => Err(OppsumError::UnsupportedFormat(
            "no content type declared".to_string(),
        )),
    }
}

/// Run pdftotext and capture the extracted text from stdout.
async fn extract_pdf_text(path: &Path) -> Result<String> {
    info!("Extracting text from PDF");

    let source = path.to_string_lossy().into_owned();
    let output = run_tool("pdftotext", &[&source, "-"]).await?;

    if output.stdout.trim().is_empty() {
        return Err(OppsumError::UnsupportedFormat(
            "PDF contained no extractable text".to_string(),
        ));
    }

    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plain_text_is_read_directly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello from a text file").unwrap();

        let text = extract_text(&path, Some("text/plain")).await.unwrap();
        assert_eq!(text, "hello from a text file");
    }

    #[tokio::test]
    async fn test_markdown_counts_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# heading").unwrap();

        let text = extract_text(&path, Some("text/markdown")).await.unwrap();
        assert_eq!(text, "# heading");
    }

    #[tokio::test]
    async fn test_unsupported_type_rejected_without_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.zip");
        std::fs::write(&path, b"PK").unwrap();

        let err = extract_text(&path, Some("application/zip")).await.unwrap_err();
        assert!(matches!(err, OppsumError::UnsupportedFormat(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_missing_content_type_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mystery");
        std::fs::write(&path, b"???").unwrap();

        let err = extract_text(&path, None).await.unwrap_err();
        assert!(matches!(err, OppsumError::UnsupportedFormat(_)));
    }
}
