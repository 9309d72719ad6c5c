//! Oppsum server entry point.

use anyhow::Result;
use clap::Parser;
use oppsum::config::{Credentials, Settings};
use oppsum::orchestrator::Pipeline;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// HTTP backend for transcribing and summarizing videos, transcripts,
/// and documents.
#[derive(Parser)]
#[command(name = "oppsum", version, about)]
struct Cli {
    /// Address to bind to (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Path to a config file
    #[arg(long)]
    config: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("oppsum={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }

    // Fail fast on missing credentials before accepting any traffic
    let credentials = Credentials::from_env(settings.summarization.provider)?;

    // Ensure artifact directories exist
    std::fs::create_dir_all(settings.uploads_dir())?;
    std::fs::create_dir_all(settings.audio_dir())?;

    let pipeline = Pipeline::new(&settings, &credentials)?;

    oppsum::server::run(&settings, pipeline).await
}
