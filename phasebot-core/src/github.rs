//! GitHub REST client implementing [`IssueTracker`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, Method, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use url::Url;

use crate::issue::{IssueRef, IssueSnapshot};
use crate::recording::{RecordingLogger, RecordingMiddleware, CORRELATION_ID_HEADER};
use crate::tracker::{IssueTracker, TrackerError};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";

/// Supplies the bearer token for each request.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<String>;
}

/// A fixed token, e.g. `GITHUB_TOKEN` in Actions or a personal access token.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[derive(Clone)]
pub struct GitHubClient {
    client: ClientWithMiddleware,
    api_base: Url,
    tokens: Arc<dyn TokenProvider>,
    correlation_id: Option<String>,
}

/// GitHub may send `null` for either list.
#[derive(Debug, Deserialize)]
struct IssueResponse {
    #[serde(default)]
    assignees: Option<Vec<LoginResponse>>,
    #[serde(default)]
    labels: Option<Vec<LabelResponse>>,
}

impl IssueResponse {
    fn assignee_logins(&self) -> impl Iterator<Item = &str> {
        self.assignees.iter().flatten().map(|a| a.login.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct LabelResponse {
    name: String,
}

#[derive(Debug, Serialize)]
struct AssigneesRequest<'a> {
    assignees: &'a [String],
}

#[derive(Debug, Serialize)]
struct LabelsRequest<'a> {
    labels: &'a [String],
}

#[derive(Debug, Serialize)]
struct CreateCommentRequest<'a> {
    body: &'a str,
}

impl GitHubClient {
    pub fn new(api_base: &str, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        Self::new_with_recording(api_base, tokens, None)
    }

    pub fn new_with_recording(
        api_base: &str,
        tokens: Arc<dyn TokenProvider>,
        recording_logger: Option<RecordingLogger>,
    ) -> Result<Self> {
        let api_base =
            Url::parse(api_base).with_context(|| format!("Invalid GitHub API URL {api_base:?}"))?;
        if api_base.cannot_be_a_base() {
            anyhow::bail!("GitHub API URL {api_base} cannot be a base URL");
        }

        Ok(Self {
            client: create_github_client(recording_logger)?,
            api_base,
            tokens,
            correlation_id: None,
        })
    }

    /// Tag every request from this client with a correlation id.
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    fn issue_url(&self, issue: &IssueRef, tail: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        let number = issue.number.to_string();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend([
                    "repos",
                    issue.owner.as_str(),
                    issue.repo_name.as_str(),
                    "issues",
                    number.as_str(),
                ])
                .extend(tail);
        }
        url
    }

    async fn send<B: Serialize>(
        &self,
        operation: &'static str,
        what: String,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<reqwest::Response, TrackerError> {
        let token = self.tokens.token().await.map_err(|e| {
            error!("Failed to obtain GitHub token for {}: {:#}", operation, e);
            TrackerError::transport(operation, format!("no token: {e:#}"))
        })?;

        let mut request_builder = self
            .client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", token));

        if let Some(body) = body {
            let json = serde_json::to_string(body)
                .map_err(|e| TrackerError::transport(operation, e.to_string()))?;
            request_builder = request_builder
                .body(json)
                .header("Content-Type", "application/json");
        }

        if let Some(cid) = &self.correlation_id {
            request_builder = request_builder.header(CORRELATION_ID_HEADER, cid);
        }

        let response = request_builder.send().await.map_err(|e| {
            error!("GitHub request {} failed: {}", operation, e);
            TrackerError::transport(operation, e.to_string())
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TrackerError::not_found(what));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("GitHub API error: {} - {}", status, error_text);
            return Err(TrackerError::transport(
                operation,
                format!("{} - {}", status, error_text),
            ));
        }

        Ok(response)
    }
}

#[async_trait]
impl IssueTracker for GitHubClient {
    async fn get_issue(&self, issue: &IssueRef) -> Result<IssueSnapshot, TrackerError> {
        info!("Fetching issue {}", issue);

        let response = self
            .send::<()>(
                "get_issue",
                format!("issue {}", issue),
                Method::GET,
                self.issue_url(issue, &[]),
                None,
            )
            .await?;

        let body: IssueResponse = response
            .json()
            .await
            .map_err(|e| TrackerError::transport("get_issue", format!("bad response: {e}")))?;

        Ok(IssueSnapshot::new(
            body.assignees.unwrap_or_default().into_iter().map(|a| a.login),
            body.labels.unwrap_or_default().into_iter().map(|l| l.name),
        ))
    }

    async fn add_assignees(
        &self,
        issue: &IssueRef,
        logins: &[String],
    ) -> Result<(), TrackerError> {
        let response = self
            .send(
                "add_assignees",
                format!("issue {}", issue),
                Method::POST,
                self.issue_url(issue, &["assignees"]),
                Some(&AssigneesRequest { assignees: logins }),
            )
            .await?;

        // GitHub answers 2xx and silently drops logins it cannot assign
        let body: IssueResponse = response
            .json()
            .await
            .map_err(|e| TrackerError::transport("add_assignees", format!("bad response: {e}")))?;

        let missing: Vec<&str> = logins
            .iter()
            .map(String::as_str)
            .filter(|login| !body.assignee_logins().any(|a| a.eq_ignore_ascii_case(login)))
            .collect();
        if !missing.is_empty() {
            error!("GitHub did not assign {:?} on {}", missing, issue);
            return Err(TrackerError::transport(
                "add_assignees",
                format!("{} not assignable on {}", missing.join(", "), issue),
            ));
        }
        Ok(())
    }

    async fn remove_assignees(
        &self,
        issue: &IssueRef,
        logins: &[String],
    ) -> Result<(), TrackerError> {
        self.send(
            "remove_assignees",
            format!("issue {}", issue),
            Method::DELETE,
            self.issue_url(issue, &["assignees"]),
            Some(&AssigneesRequest { assignees: logins }),
        )
        .await?;
        Ok(())
    }

    async fn add_labels(&self, issue: &IssueRef, labels: &[String]) -> Result<(), TrackerError> {
        self.send(
            "add_labels",
            format!("issue {}", issue),
            Method::POST,
            self.issue_url(issue, &["labels"]),
            Some(&LabelsRequest { labels }),
        )
        .await?;
        Ok(())
    }

    async fn remove_label(&self, issue: &IssueRef, label: &str) -> Result<(), TrackerError> {
        self.send::<()>(
            "remove_label",
            format!("label {:?} on {}", label, issue),
            Method::DELETE,
            self.issue_url(issue, &["labels", label]),
            None,
        )
        .await?;
        Ok(())
    }

    async fn create_comment(&self, issue: &IssueRef, body: &str) -> Result<(), TrackerError> {
        info!("Posting comment to {}", issue);
        self.send(
            "create_comment",
            format!("issue {}", issue),
            Method::POST,
            self.issue_url(issue, &["comments"]),
            Some(&CreateCommentRequest { body }),
        )
        .await?;
        Ok(())
    }
}

/// Build the HTTP client, optionally recording every call.
pub fn create_github_client(
    recording_logger: Option<RecordingLogger>,
) -> Result<ClientWithMiddleware> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
    headers.insert(
        HeaderName::from_static("x-github-api-version"),
        HeaderValue::from_static(API_VERSION),
    );

    let client = Client::builder()
        .user_agent(concat!("phasebot/", env!("CARGO_PKG_VERSION")))
        .default_headers(headers)
        .build()
        .context("Failed to create HTTP client")?;

    let mut builder = ClientBuilder::new(client);

    if let Some(logger) = recording_logger {
        builder = builder.with(RecordingMiddleware::new(logger));
    }

    Ok(builder.build())
}
