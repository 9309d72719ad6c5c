//! Configuration settings for Oppsum.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub transcription: TranscriptionSettings,
    pub summarization: SummarizationSettings,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Maximum accepted upload size in megabytes.
    pub max_upload_mb: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            max_upload_mb: 256,
        }
    }
}

/// Filesystem locations for temporary artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory for uploaded files and summarizer output attachments.
    pub uploads_dir: String,
    /// Directory for downloaded and transcoded audio.
    pub audio_dir: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            uploads_dir: "/tmp/oppsum/uploads".to_string(),
            audio_dir: "/tmp/oppsum/audio".to_string(),
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Base URL of the AssemblyAI v2 API.
    pub base_url: String,
    /// Seconds between job status polls.
    pub poll_interval_seconds: u64,
    /// Maximum number of status polls before giving up.
    pub max_poll_attempts: u32,
    /// Prefer caption extraction over audio transcription for YouTube
    /// summaries when captions are available.
    pub prefer_subtitles: bool,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.assemblyai.com/v2".to_string(),
            poll_interval_seconds: 5,
            max_poll_attempts: 40,
            prefer_subtitles: false,
        }
    }
}

/// Summarization backend selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SummarizationProvider {
    /// Google Gemini (default).
    #[default]
    Gemini,
    /// OpenAI chat completions.
    OpenAi,
}

impl std::str::FromStr for SummarizationProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(SummarizationProvider::Gemini),
            "openai" => Ok(SummarizationProvider::OpenAi),
            _ => Err(format!("Unknown summarization provider: {}", s)),
        }
    }
}

impl std::fmt::Display for SummarizationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummarizationProvider::Gemini => write!(f, "gemini"),
            SummarizationProvider::OpenAi => write!(f, "openai"),
        }
    }
}

/// Summarization service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizationSettings {
    /// Summarization provider (gemini, openai).
    pub provider: SummarizationProvider,
    /// Gemini model name.
    pub gemini_model: String,
    /// Base URL of the Gemini generateContent API.
    pub gemini_base_url: String,
    /// OpenAI model name.
    pub openai_model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
    /// Top-k sampling cutoff (Gemini only).
    pub top_k: u32,
    /// Maximum generated tokens.
    pub max_output_tokens: u32,
}

impl Default for SummarizationSettings {
    fn default() -> Self {
        Self {
            provider: SummarizationProvider::Gemini,
            gemini_model: "gemini-2.0-flash".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            temperature: 1.0,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("oppsum")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded uploads directory path.
    pub fn uploads_dir(&self) -> PathBuf {
        Self::expand_path(&self.storage.uploads_dir)
    }

    /// Get the expanded audio directory path.
    pub fn audio_dir(&self) -> PathBuf {
        Self::expand_path(&self.storage.audio_dir)
    }
}

/// API credentials resolved from the environment at startup.
///
/// The process refuses to start without the keys the configured providers
/// need, so a missing credential surfaces immediately rather than on the
/// first request.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// AssemblyAI API key (transcription).
    pub assemblyai_api_key: String,
    /// Gemini API key (required when the gemini provider is selected).
    pub gemini_api_key: Option<String>,
}

impl Credentials {
    /// Resolve credentials from the environment, failing fast on anything
    /// the selected provider requires.
    ///
    /// The OpenAI key is read directly by `async-openai` from
    /// `OPENAI_API_KEY`; here it is only checked for presence.
    pub fn from_env(provider: SummarizationProvider) -> crate::error::Result<Self> {
        let assemblyai_api_key = std::env::var("ASSEMBLYAI_API_KEY").map_err(|_| {
            crate::error::OppsumError::Config(
                "ASSEMBLYAI_API_KEY is missing! Set it in the environment".to_string(),
            )
        })?;

        let gemini_api_key = std::env::var("GEMINI_API_KEY").ok();

        match provider {
            SummarizationProvider::Gemini if gemini_api_key.is_none() => {
                return Err(crate::error::OppsumError::Config(
                    "GEMINI_API_KEY is missing! Set it in the environment".to_string(),
                ));
            }
            SummarizationProvider::OpenAi if std::env::var("OPENAI_API_KEY").is_err() => {
                return Err(crate::error::OppsumError::Config(
                    "OPENAI_API_KEY is missing! Set it in the environment".to_string(),
                ));
            }
            _ => {}
        }

        Ok(Self {
            assemblyai_api_key,
            gemini_api_key,
        })
    }
}
