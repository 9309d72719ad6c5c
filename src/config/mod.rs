//! Configuration module for Oppsum.
//!
//! Handles loading application settings and resolving API credentials.

mod settings;

pub use settings::{
    Credentials, ServerSettings, Settings, StorageSettings, SummarizationProvider,
    SummarizationSettings, TranscriptionSettings,
};
