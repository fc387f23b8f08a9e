pub mod config;
pub mod github_app;
pub mod webhook;

use anyhow::Result;
use axum::{http::StatusCode, response::Json, routing::get, Router};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use phasebot_core::{
    ConfigurationError, PhaseLabelConfig, PhraseConfig, RecordingLogger, StaticToken,
    TokenProvider,
};

use crate::config::{Config, Credentials};
use crate::github_app::{GitHubApp, InstallationToken};

mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub fn get_bot_version() -> String {
    // Nix builds pass the hash in; cargo builds rely on built's git detection
    let git_hash = option_env!("PHASEBOT_GIT_HASH").or(built_info::GIT_COMMIT_HASH);
    match git_hash {
        Some(hash) if hash.len() >= 8 => hash[..8].to_string(),
        Some(hash) => hash.to_string(),
        None => built_info::PKG_VERSION.to_string(),
    }
}

/// Where tokens for GitHub API calls come from.
pub enum GitHubAuth {
    Token(Arc<dyn TokenProvider>),
    App(Arc<GitHubApp>),
}

impl GitHubAuth {
    /// Token source for one delivery. App installs need the delivery's
    /// installation id.
    pub fn token_provider(
        &self,
        installation_id: Option<u64>,
    ) -> Result<Arc<dyn TokenProvider>, ConfigurationError> {
        match self {
            GitHubAuth::Token(provider) => Ok(provider.clone()),
            GitHubAuth::App(app) => {
                let installation_id = installation_id.ok_or(ConfigurationError::MissingField {
                    field: "installation.id",
                })?;
                Ok(Arc::new(InstallationToken::new(app.clone(), installation_id)))
            }
        }
    }
}

pub struct AppState {
    pub github_auth: GitHubAuth,
    pub github_api_url: String,
    pub webhook_secret: String,
    pub phrases: PhraseConfig,
    pub phases: PhaseLabelConfig,
    pub recording_logger: Option<RecordingLogger>,
}

impl AppState {
    pub fn from_config(config: Config, recording_logger: Option<RecordingLogger>) -> Result<Self> {
        let github_auth = match config.credentials {
            Credentials::Token(token) => GitHubAuth::Token(Arc::new(StaticToken::new(token))),
            Credentials::App {
                app_id,
                private_key,
            } => GitHubAuth::App(Arc::new(GitHubApp::new(
                &config.github_api_url,
                app_id,
                &private_key,
                recording_logger.clone(),
            )?)),
        };

        Ok(Self {
            github_auth,
            github_api_url: config.github_api_url,
            webhook_secret: config.github_webhook_secret,
            phrases: config.phrases,
            phases: config.phases,
            recording_logger,
        })
    }
}

async fn health_check() -> Result<Json<serde_json::Value>, StatusCode> {
    Ok(Json(json!({
        "status": "healthy",
        "service": "phasebot",
        "version": get_bot_version()
    })))
}

/// The complete HTTP surface: `/health` and the signed `/webhook`.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(webhook::webhook_router(state.clone()))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
