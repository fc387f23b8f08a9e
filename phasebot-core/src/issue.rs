//! Issue identity, the triggering comment, and the issue snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Identifies one issue in one repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueRef {
    pub owner: String,
    pub repo_name: String,
    pub number: u64,
}

impl IssueRef {
    pub fn new(owner: impl Into<String>, repo_name: impl Into<String>, number: u64) -> Self {
        Self {
            owner: owner.into(),
            repo_name: repo_name.into(),
            number,
        }
    }
}

impl fmt::Display for IssueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo_name, self.number)
    }
}

/// The new comment that triggered this invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentEvent {
    pub issue: IssueRef,
    pub body: String,
    pub author_login: String,
}

/// Assignees and labels of an issue, read once per invocation.
///
/// This is a point-in-time copy; changes made on the tracker after the
/// fetch are not reflected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSnapshot {
    pub assignees: BTreeSet<String>,
    pub labels: BTreeSet<String>,
}

impl IssueSnapshot {
    pub fn new<A, L>(assignees: A, labels: L) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        Self {
            assignees: assignees.into_iter().map(Into::into).collect(),
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_assigned_to(&self, login: &str) -> bool {
        self.assignees.contains(login)
    }
}
