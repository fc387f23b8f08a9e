//! What an invocation ended up doing.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::phase::Phase;
use crate::command::ActionKind;

/// Terminal result of one invocation. Produced and consumed within that
/// invocation; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The commenter was assigned.
    Assigned { volunteer: String },
    /// Assign was refused because the issue has assignees.
    AlreadyAssigned,
    /// The issue moved to the next phase.
    Advanced { from: Phase, to: Phase },
    /// Complete was refused because the commenter is not an assignee.
    NotAssignee,
    /// The issue carries no tracked phase label; nothing was done.
    NotInTrackedPhase,
    /// Complete on the last configured phase; nothing was done.
    FinalPhase { phase: Phase },
    /// A reserved phrase was recognized; nothing was done.
    Recognized { action: ActionKind },
    /// The comment contains no trigger phrase.
    NoMatch,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Assigned { volunteer } => write!(f, "assigned to {}", volunteer),
            Outcome::AlreadyAssigned => write!(f, "already assigned"),
            Outcome::Advanced { from, to } => write!(f, "advanced from {} to {}", from, to),
            Outcome::NotAssignee => write!(f, "not an assignee"),
            Outcome::NotInTrackedPhase => write!(f, "not in a tracked phase"),
            Outcome::FinalPhase { phase } => write!(f, "already in final phase {}", phase),
            Outcome::Recognized { action } => write!(f, "recognized {}", action),
            Outcome::NoMatch => write!(f, "no match"),
        }
    }
}
