//! Assign: a commenter volunteers for the issue's current phase.

use super::Plan;
use crate::issue::{CommentEvent, IssueSnapshot};
use crate::state_machine::effect::{CommentContent, Effect};
use crate::state_machine::outcome::Outcome;
use crate::state_machine::phase::{current_phase, CurrentPhase, PhaseLabelConfig};

/// Handle an Assign request.
///
/// - Issue already has assignees: reply refusing, no mutation.
/// - Issue is in no tracked phase: silent, log only.
/// - Otherwise: assign the commenter, then reply. The assignment comes first
///   so the reply never refers to an assignment that has not happened.
pub fn handle(event: &CommentEvent, snapshot: &IssueSnapshot, phases: &PhaseLabelConfig) -> Plan {
    if !snapshot.assignees.is_empty() {
        return Plan::new(
            Outcome::AlreadyAssigned,
            vec![Effect::CreateComment {
                content: CommentContent::AlreadyAssigned {
                    requester: event.author_login.clone(),
                    assignees: snapshot.assignees.iter().cloned().collect(),
                },
            }],
        );
    }

    let phase = match current_phase(snapshot, phases) {
        CurrentPhase::Tracked(phase) => phase,
        CurrentPhase::Untracked => {
            return Plan::log_only(
                Outcome::NotInTrackedPhase,
                format!(
                    "Ignoring assign request from {} on {}: no tracked phase label",
                    event.author_login, event.issue
                ),
            );
        }
    };

    let volunteer = event.author_login.clone();
    Plan::new(
        Outcome::Assigned {
            volunteer: volunteer.clone(),
        },
        vec![
            Effect::AddAssignees {
                logins: vec![volunteer.clone()],
            },
            Effect::CreateComment {
                content: CommentContent::Assigned { volunteer, phase },
            },
        ],
    )
}
