//! Complete: the assignee finishes the current phase and the issue advances.

use super::Plan;
use crate::issue::{CommentEvent, IssueSnapshot};
use crate::state_machine::effect::{CommentContent, Effect, LogLevel};
use crate::state_machine::outcome::Outcome;
use crate::state_machine::phase::{
    current_phase, next_phase, CurrentPhase, NextPhase, PhaseLabelConfig,
};

/// Handle a Complete request.
///
/// Checks run in this order:
/// 1. Commenter is not an assignee: reply refusing, no mutation.
/// 2. Issue is in no tracked phase: silent, log only.
/// 3. Issue is in the last phase: silent, log only.
/// 4. Otherwise: unassign the commenter, swap the phase label, reply.
pub fn handle(event: &CommentEvent, snapshot: &IssueSnapshot, phases: &PhaseLabelConfig) -> Plan {
    let author = &event.author_login;

    if !snapshot.is_assigned_to(author) {
        return Plan::new(
            Outcome::NotAssignee,
            vec![Effect::CreateComment {
                content: CommentContent::NotAssignee {
                    requester: author.clone(),
                },
            }],
        );
    }

    let current = match current_phase(snapshot, phases) {
        CurrentPhase::Tracked(phase) => phase,
        CurrentPhase::Untracked => {
            return Plan::log_only(
                Outcome::NotInTrackedPhase,
                format!(
                    "Ignoring complete request from {} on {}: no tracked phase label",
                    author, event.issue
                ),
            );
        }
    };

    let next = match next_phase(&current, phases) {
        NextPhase::Phase(next) => next,
        NextPhase::Terminal => {
            return Plan::log_only(
                Outcome::FinalPhase {
                    phase: current.clone(),
                },
                format!(
                    "Ignoring complete request from {} on {}: {} is the final phase",
                    author, event.issue, current
                ),
            );
        }
    };

    let mut effects = Vec::new();

    let tracked = phases
        .labels()
        .iter()
        .filter(|label| snapshot.labels.contains(*label))
        .count();
    if tracked > 1 {
        effects.push(Effect::Log {
            level: LogLevel::Warn,
            message: format!(
                "{} carries {} phase labels, advancing from {}",
                event.issue, tracked, current
            ),
        });
    }

    effects.extend([
        Effect::RemoveAssignees {
            logins: vec![author.clone()],
        },
        Effect::RemoveLabel {
            label: current.label.clone(),
        },
        Effect::AddLabels {
            labels: vec![next.label.clone()],
        },
        Effect::CreateComment {
            content: CommentContent::Advanced {
                author: author.clone(),
                from: current.clone(),
                to: next.clone(),
            },
        },
    ]);

    Plan::new(
        Outcome::Advanced {
            from: current,
            to: next,
        },
        effects,
    )
}
