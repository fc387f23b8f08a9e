//! Effects (side effects as data).
//!
//! Handlers never talk to the tracker. They return effects, and the
//! interpreter executes them in order against an [`IssueTracker`].
//!
//! [`IssueTracker`]: crate::tracker::IssueTracker

use serde::{Deserialize, Serialize};

use super::phase::Phase;

/// Everything a handler can ask for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    // =========================================================================
    // Issue mutations
    // =========================================================================
    /// Add users to the issue's assignees.
    AddAssignees { logins: Vec<String> },

    /// Remove users from the issue's assignees.
    RemoveAssignees { logins: Vec<String> },

    /// Add labels to the issue.
    AddLabels { labels: Vec<String> },

    /// Remove a single label from the issue.
    RemoveLabel { label: String },

    // =========================================================================
    // Notification
    // =========================================================================
    /// Post a reply comment on the issue.
    CreateComment { content: CommentContent },

    // =========================================================================
    // Logging
    // =========================================================================
    /// Log a message. Never reaches the tracker.
    Log { level: LogLevel, message: String },
}

impl Effect {
    /// True for effects that change labels or assignees.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Effect::AddAssignees { .. }
                | Effect::RemoveAssignees { .. }
                | Effect::AddLabels { .. }
                | Effect::RemoveLabel { .. }
        )
    }

    /// True for effects that result in a tracker call.
    pub fn is_external(&self) -> bool {
        !matches!(self, Effect::Log { .. })
    }

    /// Name of the tracker operation this effect maps to.
    pub fn operation(&self) -> &'static str {
        match self {
            Effect::AddAssignees { .. } => "add_assignees",
            Effect::RemoveAssignees { .. } => "remove_assignees",
            Effect::AddLabels { .. } => "add_labels",
            Effect::RemoveLabel { .. } => "remove_label",
            Effect::CreateComment { .. } => "create_comment",
            Effect::Log { .. } => "log",
        }
    }
}

/// Reply comments the notifier knows how to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommentContent {
    /// The commenter now owns the issue for this phase.
    Assigned { volunteer: String, phase: Phase },

    /// Someone else already owns the issue.
    AlreadyAssigned {
        requester: String,
        assignees: Vec<String>,
    },

    /// The commenter tried to complete a phase they are not assigned to.
    NotAssignee { requester: String },

    /// The phase is done and the issue moved on.
    Advanced {
        author: String,
        from: Phase,
        to: Phase,
    },
}

/// Log level for logging effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warn,
}
