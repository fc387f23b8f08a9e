//! One engine invocation: one comment in, one outcome out.

use serde::Serialize;
use tracing::info;

use crate::command::{match_phrase, ActionKind, PhraseConfig};
use crate::error::{ConfigurationError, EngineError};
use crate::issue::{CommentEvent, IssueRef};
use crate::state_machine::{execute_effects, plan, Effect, Outcome, PhaseLabelConfig};
use crate::tracker::IssueTracker;

/// The only event kind the engine accepts.
pub const ISSUE_COMMENT_EVENT: &str = "issue_comment";

/// Reject any event other than a new issue comment.
pub fn check_event_kind(event_kind: &str) -> Result<(), ConfigurationError> {
    if event_kind == ISSUE_COMMENT_EVENT {
        Ok(())
    } else {
        Err(ConfigurationError::UnsupportedEvent {
            expected: ISSUE_COMMENT_EVENT,
            actual: event_kind.to_string(),
        })
    }
}

/// Everything one invocation needs, passed in by the caller.
#[derive(Debug, Clone)]
pub struct TriggerContext {
    /// Event name as delivered by GitHub (`X-GitHub-Event` / `GITHUB_EVENT_NAME`).
    pub event_kind: String,
    pub event: CommentEvent,
    pub phrases: PhraseConfig,
    pub phases: PhaseLabelConfig,
}

/// What an invocation did, for the caller to log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationReport {
    pub issue: IssueRef,
    pub author: String,
    pub action: Option<ActionKind>,
    pub outcome: Outcome,
    /// Tracker calls issued after the snapshot read, in order.
    pub issued: Vec<Effect>,
}

/// Run one invocation to completion or first failure.
///
/// Configuration is checked before any tracker call. A comment with no
/// trigger phrase returns `Outcome::NoMatch` without touching the tracker.
/// Otherwise the issue is read once, the handler plans, and the interpreter
/// executes the plan fail-fast.
pub async fn run_invocation<T>(
    ctx: &TriggerContext,
    tracker: &T,
) -> Result<InvocationReport, EngineError>
where
    T: IssueTracker + ?Sized,
{
    check_event_kind(&ctx.event_kind)?;
    ctx.phrases.validate()?;

    let event = &ctx.event;

    let Some(action) = match_phrase(&event.body, &ctx.phrases) else {
        info!(
            "No trigger phrase in comment by {} on {}",
            event.author_login, event.issue
        );
        return Ok(InvocationReport {
            issue: event.issue.clone(),
            author: event.author_login.clone(),
            action: None,
            outcome: Outcome::NoMatch,
            issued: vec![],
        });
    };

    info!(
        "Found {} phrase in comment by {} on {}",
        action, event.author_login, event.issue
    );

    let snapshot = tracker
        .get_issue(&event.issue)
        .await
        .map_err(|source| EngineError::Tracker {
            source,
            issued: vec![],
        })?;

    let planned = plan(action, event, &snapshot, &ctx.phases);
    info!("Planned outcome for {}: {}", event.issue, planned.outcome);

    let issued = execute_effects(tracker, &event.issue, planned.effects).await?;

    info!(
        "Finished {} on {}: {} ({} call(s) issued)",
        action,
        event.issue,
        planned.outcome,
        issued.len()
    );

    Ok(InvocationReport {
        issue: event.issue.clone(),
        author: event.author_login.clone(),
        action: Some(action),
        outcome: planned.outcome,
        issued,
    })
}
