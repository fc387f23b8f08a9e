use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};

use phasebot_core::RecordingLogger;
use phasebot_server::config::Config;
use phasebot_server::{app, get_bot_version, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Starting phasebot {}", get_bot_version());

    let config = Config::from_env().context("Failed to load configuration from environment")?;
    let port = config.port;

    let recording_logger = if config.recording_enabled {
        let logger = RecordingLogger::open(&config.recording_log_path)
            .await
            .context("Failed to open recording journal")?;
        info!(
            "Recording enabled, logging to: {}",
            config.recording_log_path
        );
        Some(logger)
    } else {
        None
    };

    info!(
        "Tracking phases {:?} on {}",
        config.phases.labels(),
        config.github_api_url
    );

    let app_state = Arc::new(AppState::from_config(config, recording_logger)?);

    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Server listening on port {}", port);

    axum::serve(listener, app(app_state)).await?;

    Ok(())
}
