//! Oppsum - Media Transcription and Summarization Backend
//!
//! An HTTP backend that turns videos, transcripts, and documents into
//! summaries. The name comes from the Norwegian "oppsummering" (summary).
//!
//! # Overview
//!
//! Oppsum exposes a small JSON API that can:
//! - Transcribe YouTube videos (yt-dlp + AssemblyAI)
//! - Summarize videos, raw transcripts, and uploaded documents
//! - Transcribe uploaded video files
//!
//! All of the hard work is delegated: audio extraction to yt-dlp and
//! ffmpeg, speech-to-text to AssemblyAI, summarization to Gemini or
//! OpenAI, PDF text extraction to pdftotext. This crate is the
//! orchestration pipeline in between.
//!
//! # Architecture
//!
//! - `config` - Configuration and credential management
//! - `process` - External CLI tool invocation
//! - `audio` - Audio download and transcoding
//! - `subtitles` - Caption extraction (fast path around transcription)
//! - `transcription` - Remote speech-to-text with bounded polling
//! - `summarization` - Remote text generation (pluggable backends)
//! - `document` - Uploaded document text extraction
//! - `orchestrator` - Pipeline coordination and artifact lifecycle
//! - `server` - HTTP surface

pub mod audio;
pub mod config;
pub mod document;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod process;
pub mod server;
pub mod subtitles;
pub mod summarization;
pub mod transcription;

pub use error::{OppsumError, Result};
