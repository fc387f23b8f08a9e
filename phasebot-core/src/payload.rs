//! GitHub `issue_comment` event payload.
//!
//! The same JSON arrives as a webhook body and as the `GITHUB_EVENT_PATH`
//! file in Actions. Every field is optional here; `into_comment_event`
//! decides which ones are required and reports the first missing one.

use serde::Deserialize;

use crate::error::ConfigurationError;
use crate::issue::{CommentEvent, IssueRef};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueCommentPayload {
    pub action: Option<String>,
    pub issue: Option<Issue>,
    pub comment: Option<Comment>,
    pub repository: Option<Repository>,
    pub installation: Option<Installation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: Option<u64>,
    /// Present when the "issue" is a pull request.
    pub pull_request: Option<PullRequestLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestLink {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub id: Option<u64>,
    pub body: Option<String>,
    pub user: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: Option<String>,
    #[serde(rename = "type")]
    pub user_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub owner: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Installation {
    pub id: u64,
}

impl IssueCommentPayload {
    /// Validate the payload and extract the triggering comment.
    pub fn into_comment_event(self) -> Result<CommentEvent, ConfigurationError> {
        let issue = self.issue.ok_or(missing("issue"))?;
        let number = issue.number.ok_or(missing("issue.number"))?;

        let comment = self.comment.ok_or(missing("comment"))?;
        let body = comment.body.ok_or(missing("comment.body"))?;
        let author_login = comment
            .user
            .and_then(|user| user.login)
            .ok_or(missing("comment.user.login"))?;

        let repository = self.repository.ok_or(missing("repository"))?;
        let owner = repository
            .owner
            .and_then(|owner| owner.login)
            .ok_or(missing("repository.owner.login"))?;
        let repo_name = repository.name.ok_or(missing("repository.name"))?;

        Ok(CommentEvent {
            issue: IssueRef {
                owner,
                repo_name,
                number,
            },
            body,
            author_login,
        })
    }

    /// Whether the comment was written by a bot account (including us).
    pub fn is_bot_comment(&self) -> bool {
        self.comment
            .as_ref()
            .and_then(|c| c.user.as_ref())
            .and_then(|u| u.user_type.as_deref())
            == Some("Bot")
    }

    pub fn is_pull_request(&self) -> bool {
        self.issue
            .as_ref()
            .is_some_and(|issue| issue.pull_request.is_some())
    }

    pub fn installation_id(&self) -> Option<u64> {
        self.installation.as_ref().map(|i| i.id)
    }

    pub fn repository_full_name(&self) -> &str {
        self.repository
            .as_ref()
            .and_then(|r| r.full_name.as_deref())
            .unwrap_or("unknown")
    }
}

fn missing(field: &'static str) -> ConfigurationError {
    ConfigurationError::MissingField { field }
}
