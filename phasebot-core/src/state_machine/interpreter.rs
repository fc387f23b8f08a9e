//! Effect interpreter that executes effects against an issue tracker.
//!
//! The interpreter is the boundary between the pure handlers and the
//! tracker. Effects run strictly in order, each awaited before the next.
//! The first failure stops the sequence: later effects are never attempted
//! and earlier ones stay committed.

use tracing::{error, info, warn};

use super::effect::{Effect, LogLevel};
use super::notifier::format_comment_content;
use crate::error::EngineError;
use crate::issue::IssueRef;
use crate::tracker::{IssueTracker, TrackerError};

/// Execute effects in order, stopping at the first failure.
///
/// On success returns the effects that reached the tracker, in issue order.
/// On failure the error carries the ones that completed before it.
pub async fn execute_effects<T>(
    tracker: &T,
    issue: &IssueRef,
    effects: Vec<Effect>,
) -> Result<Vec<Effect>, EngineError>
where
    T: IssueTracker + ?Sized,
{
    let mut issued = Vec::new();

    for effect in effects {
        match execute_effect(tracker, issue, &effect).await {
            Ok(()) => {
                if effect.is_external() {
                    info!("Issued {} on {}", effect.operation(), issue);
                    issued.push(effect);
                }
            }
            Err(source) => {
                error!(
                    "{} on {} failed after {} completed call(s): {}",
                    effect.operation(),
                    issue,
                    issued.len(),
                    source
                );
                return Err(EngineError::Tracker { source, issued });
            }
        }
    }

    Ok(issued)
}

/// Execute a single effect.
async fn execute_effect<T>(
    tracker: &T,
    issue: &IssueRef,
    effect: &Effect,
) -> Result<(), TrackerError>
where
    T: IssueTracker + ?Sized,
{
    match effect {
        Effect::AddAssignees { logins } => tracker.add_assignees(issue, logins).await,

        Effect::RemoveAssignees { logins } => tracker.remove_assignees(issue, logins).await,

        Effect::AddLabels { labels } => tracker.add_labels(issue, labels).await,

        Effect::RemoveLabel { label } => match tracker.remove_label(issue, label).await {
            // Already gone is the state we wanted
            Err(TrackerError::NotFound { what }) => {
                warn!(
                    "Label {:?} already absent from {} ({} not found), continuing",
                    label, issue, what
                );
                Ok(())
            }
            other => other,
        },

        Effect::CreateComment { content } => {
            let body = format_comment_content(content);
            tracker.create_comment(issue, &body).await
        }

        Effect::Log { level, message } => {
            match level {
                LogLevel::Info => info!("{}", message),
                LogLevel::Warn => warn!("{}", message),
            }
            Ok(())
        }
    }
}
