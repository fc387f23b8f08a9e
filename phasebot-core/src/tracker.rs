//! Issue tracker abstraction.
//!
//! The engine only needs six calls from an issue tracker. `GitHubClient`
//! implements them over the REST API; tests use in-memory fakes.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::issue::{IssueRef, IssueSnapshot};

/// A failed tracker call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// The issue (or label) does not exist.
    #[error("{what} not found")]
    NotFound { what: String },

    /// Any other failure: network, auth, rate limit, unexpected status.
    #[error("{operation} failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },
}

impl TrackerError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            operation,
            message: message.into(),
        }
    }
}

/// The operations the engine performs on an issue tracker.
///
/// Each call is a single request/response; the engine awaits one before
/// issuing the next.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Read the issue's assignees and labels.
    async fn get_issue(&self, issue: &IssueRef) -> Result<IssueSnapshot, TrackerError>;

    async fn add_assignees(&self, issue: &IssueRef, logins: &[String])
        -> Result<(), TrackerError>;

    async fn remove_assignees(
        &self,
        issue: &IssueRef,
        logins: &[String],
    ) -> Result<(), TrackerError>;

    async fn add_labels(&self, issue: &IssueRef, labels: &[String]) -> Result<(), TrackerError>;

    /// Remove one label. Fails with `NotFound` if the issue lacks it.
    async fn remove_label(&self, issue: &IssueRef, label: &str) -> Result<(), TrackerError>;

    async fn create_comment(&self, issue: &IssueRef, body: &str) -> Result<(), TrackerError>;
}

/// Reads through to the wrapped tracker but only logs mutations and
/// comments.
pub struct DryRunTracker<T> {
    inner: T,
}

impl<T> DryRunTracker<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[async_trait]
impl<T: IssueTracker> IssueTracker for DryRunTracker<T> {
    async fn get_issue(&self, issue: &IssueRef) -> Result<IssueSnapshot, TrackerError> {
        self.inner.get_issue(issue).await
    }

    async fn add_assignees(
        &self,
        issue: &IssueRef,
        logins: &[String],
    ) -> Result<(), TrackerError> {
        info!("[dry-run] would assign {:?} to {}", logins, issue);
        Ok(())
    }

    async fn remove_assignees(
        &self,
        issue: &IssueRef,
        logins: &[String],
    ) -> Result<(), TrackerError> {
        info!("[dry-run] would unassign {:?} from {}", logins, issue);
        Ok(())
    }

    async fn add_labels(&self, issue: &IssueRef, labels: &[String]) -> Result<(), TrackerError> {
        info!("[dry-run] would add labels {:?} to {}", labels, issue);
        Ok(())
    }

    async fn remove_label(&self, issue: &IssueRef, label: &str) -> Result<(), TrackerError> {
        info!("[dry-run] would remove label {:?} from {}", label, issue);
        Ok(())
    }

    async fn create_comment(&self, issue: &IssueRef, body: &str) -> Result<(), TrackerError> {
        info!("[dry-run] would comment on {}:\n{}", issue, body);
        Ok(())
    }
}
