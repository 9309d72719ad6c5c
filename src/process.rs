//! External process invocation.
//!
//! Every hard piece of work in this service is delegated to a CLI tool
//! (yt-dlp, ffmpeg, pdftotext). This module runs one and captures its
//! output; callers decide what a failure means for their pipeline step.

use crate::error::{OppsumError, Result};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Captured output of a completed external tool.
#[derive(Debug)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run an external tool to completion and capture its output.
///
/// A non-zero exit status is a failure. Output on stderr alone is not:
/// yt-dlp and ffmpeg both write progress there on success, so only the
/// exit code decides.
pub async fn run_tool(program: &str, args: &[&str]) -> Result<ToolOutput> {
    debug!("Running {} {}", program, args.join(" "));

    let result = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(OppsumError::ToolNotFound(program.to_string()));
        }
        Err(e) => {
            return Err(OppsumError::ToolFailed(format!(
                "{} execution failed: {e}",
                program
            )));
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        let code = output
            .status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        return Err(OppsumError::ToolFailed(format!(
            "{} exited with status {}: {}",
            program,
            code,
            stderr.trim()
        )));
    }

    Ok(ToolOutput { stdout, stderr })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_successful_command_captures_stdout() {
        let out = run_tool("echo", &["hello"]).await.unwrap();
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_stderr_alone_is_not_a_failure() {
        // sh writes to stderr but exits 0
        let out = run_tool("sh", &["-c", "echo warn >&2"]).await.unwrap();
        assert_eq!(out.stderr.trim(), "warn");
    }

    #[tokio::test]
    async fn test_nonzero_exit_fails_with_stderr() {
        let err = run_tool("sh", &["-c", "echo boom >&2; exit 3"])
            .await
            .unwrap_err();
        match err {
            OppsumError::ToolFailed(msg) => {
                assert!(msg.contains("status 3"));
                assert!(msg.contains("boom"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_tool() {
        let err = run_tool("definitely-not-a-real-tool", &[]).await.unwrap_err();
        assert!(matches!(err, OppsumError::ToolNotFound(_)));
    }
}
