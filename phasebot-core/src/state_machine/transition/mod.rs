//! Pure action handlers.
//!
//! Each handler takes the matched action, the triggering comment, the issue
//! snapshot and the phase progression, and returns the outcome together with
//! the effects to execute. Handlers perform no I/O; the snapshot is fetched
//! by the engine beforehand.
//!
//! One module per phrase family, with co-located tests:
//! - `assign`: volunteering for the current phase
//! - `complete`: finishing the current phase and advancing
//! - `reserved`: results and unroll phrases, recognized but inert

mod assign;
mod complete;
mod reserved;

use super::effect::{Effect, LogLevel};
use super::outcome::Outcome;
use super::phase::PhaseLabelConfig;
use crate::command::ActionKind;
use crate::issue::{CommentEvent, IssueSnapshot};

/// What a handler decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub outcome: Outcome,
    /// Effects in execution order.
    pub effects: Vec<Effect>,
}

impl Plan {
    pub fn new(outcome: Outcome, effects: Vec<Effect>) -> Self {
        Self { outcome, effects }
    }

    /// An outcome that leaves the issue alone and only logs.
    pub fn log_only(outcome: Outcome, message: String) -> Self {
        Self::new(
            outcome,
            vec![Effect::Log {
                level: LogLevel::Info,
                message,
            }],
        )
    }
}

/// Dispatch a matched action to its handler.
pub fn plan(
    action: ActionKind,
    event: &CommentEvent,
    snapshot: &IssueSnapshot,
    phases: &PhaseLabelConfig,
) -> Plan {
    match action {
        ActionKind::Assign => assign::handle(event, snapshot, phases),
        ActionKind::Complete => complete::handle(event, snapshot, phases),
        ActionKind::Phase1Results | ActionKind::Phase2Results | ActionKind::Unroll => {
            reserved::handle(action, event, snapshot)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueRef;

    pub(super) fn phases() -> PhaseLabelConfig {
        PhaseLabelConfig::new(["phase1", "phase2", "phase3"]).unwrap()
    }

    pub(super) fn comment_from(author: &str) -> CommentEvent {
        CommentEvent {
            issue: IssueRef::new("octo", "tasks", 7),
            body: "irrelevant here".to_string(),
            author_login: author.to_string(),
        }
    }

    #[test]
    fn test_plan_is_pure() {
        let snapshot = IssueSnapshot::new(["alice"], ["phase1"]);
        let event = comment_from("alice");
        for action in ActionKind::ALL {
            assert_eq!(
                plan(action, &event, &snapshot, &phases()),
                plan(action, &event, &snapshot, &phases())
            );
        }
    }

    #[test]
    fn test_only_assign_and_complete_touch_the_issue() {
        let snapshot = IssueSnapshot::new(Vec::<String>::new(), ["phase1"]);
        let event = comment_from("alice");
        for action in [
            ActionKind::Phase1Results,
            ActionKind::Phase2Results,
            ActionKind::Unroll,
        ] {
            let plan = plan(action, &event, &snapshot, &phases());
            assert!(plan.effects.iter().all(|e| !e.is_external()));
        }
    }
}
