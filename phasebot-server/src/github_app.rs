//! GitHub App authentication: app JWTs and cached installation tokens.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::{error, info};

use phasebot_core::github::create_github_client;
use phasebot_core::{RecordingLogger, TokenProvider};

/// Tokens closer than this to expiry are refreshed.
const REFRESH_MARGIN_SECS: u64 = 300;

pub struct GitHubApp {
    client: ClientWithMiddleware,
    api_base: String,
    app_id: u64,
    encoding_key: EncodingKey,
    token_cache: RwLock<HashMap<u64, (String, SystemTime)>>,
}

#[derive(Debug, Serialize)]
struct GitHubAppClaims {
    iss: u64,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct InstallationTokenResponse {
    token: String,
    expires_at: String,
}

impl GitHubApp {
    pub fn new(
        api_base: &str,
        app_id: u64,
        private_key: &str,
        recording_logger: Option<RecordingLogger>,
    ) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key.as_bytes())
            .context("Failed to parse GitHub App private key")?;

        Ok(Self {
            client: create_github_client(recording_logger)?,
            api_base: api_base.trim_end_matches('/').to_string(),
            app_id,
            encoding_key,
            token_cache: RwLock::new(HashMap::new()),
        })
    }

    fn generate_jwt(&self) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("Failed to get current time")?
            .as_secs();

        let claims = GitHubAppClaims {
            iss: self.app_id,
            iat: now - 60,  // Clock skew allowance
            exp: now + 600, // GitHub's maximum
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .context("Failed to encode JWT")
    }

    /// Return a token for `installation_id`, minting a new one when the
    /// cached token is missing or about to expire.
    pub async fn installation_token(&self, installation_id: u64) -> Result<String> {
        {
            let cache = self.token_cache.read().await;
            if let Some((token, expires_at)) = cache.get(&installation_id) {
                if expires_at
                    .duration_since(SystemTime::now())
                    .unwrap_or_default()
                    .as_secs()
                    > REFRESH_MARGIN_SECS
                {
                    return Ok(token.clone());
                }
            }
        }

        let jwt = self.generate_jwt()?;
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            self.api_base, installation_id
        );

        info!(
            "Requesting new access token for installation {}",
            installation_id
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", jwt))
            .send()
            .await
            .context("Failed to send installation token request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .context("Failed to read error response body")?;
            error!(
                "GitHub App token request failed: {} - {}",
                status, error_text
            );
            return Err(anyhow!(
                "GitHub App token request failed: {} - {}",
                status,
                error_text
            ));
        }

        let token_response: InstallationTokenResponse = response
            .json()
            .await
            .context("Failed to parse installation token response")?;

        let expires_at = chrono::DateTime::parse_from_rfc3339(&token_response.expires_at)
            .context("Failed to parse token expiration")?
            .with_timezone(&Utc);
        let expires_at = UNIX_EPOCH + Duration::from_secs(expires_at.timestamp().max(0) as u64);

        self.token_cache
            .write()
            .await
            .insert(installation_id, (token_response.token.clone(), expires_at));

        Ok(token_response.token)
    }
}

/// Installation-scoped token source handed to `GitHubClient`.
pub struct InstallationToken {
    app: Arc<GitHubApp>,
    installation_id: u64,
}

impl InstallationToken {
    pub fn new(app: Arc<GitHubApp>, installation_id: u64) -> Self {
        Self {
            app,
            installation_id,
        }
    }
}

#[async_trait]
impl TokenProvider for InstallationToken {
    async fn token(&self) -> Result<String> {
        self.app.installation_token(self.installation_id).await
    }
}
