//! Results and unroll phrases.
//!
//! These phrases are recognized so they never fall through to another
//! action, but they do not change the issue yet. A handler that starts
//! mutating here must keep the interpreter's ordering rules: mutations
//! first, reply last.

use super::Plan;
use crate::command::ActionKind;
use crate::issue::{CommentEvent, IssueSnapshot};
use crate::state_machine::outcome::Outcome;

pub fn handle(action: ActionKind, event: &CommentEvent, snapshot: &IssueSnapshot) -> Plan {
    Plan::log_only(
        Outcome::Recognized { action },
        format!(
            "Recognized {} phrase from {} on {} ({} assignee(s), {} label(s)); no action taken",
            action,
            event.author_login,
            event.issue,
            snapshot.assignees.len(),
            snapshot.labels.len()
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::super::tests::comment_from;
    use super::*;
    use crate::state_machine::effect::Effect;

    #[test]
    fn test_reserved_actions_only_log() {
        let snapshot = IssueSnapshot::new(["alice"], ["phase1"]);
        for action in [
            ActionKind::Phase1Results,
            ActionKind::Phase2Results,
            ActionKind::Unroll,
        ] {
            let result = handle(action, &comment_from("alice"), &snapshot);
            assert_eq!(result.outcome, Outcome::Recognized { action });
            assert_eq!(result.effects.len(), 1);
            assert!(matches!(result.effects[0], Effect::Log { .. }));
        }
    }
}
