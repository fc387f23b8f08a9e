//! Comment-triggered phase workflow for GitHub issues.
//!
//! A comment containing a configured trigger phrase moves an issue through an
//! ordered progression of phase labels. [`engine::run_invocation`] is the
//! single entry point; the server and the Actions CLI both wrap it.

pub mod command;
pub mod engine;
pub mod error;
pub mod github;
pub mod issue;
pub mod payload;
pub mod recording;
pub mod state_machine;
pub mod tracker;

pub use command::{match_phrase, ActionKind, PhraseConfig};
pub use engine::{
    check_event_kind, run_invocation, InvocationReport, TriggerContext, ISSUE_COMMENT_EVENT,
};
pub use error::{ConfigurationError, EngineError};
pub use github::{GitHubClient, StaticToken, TokenProvider, DEFAULT_API_URL};
pub use issue::{CommentEvent, IssueRef, IssueSnapshot};
pub use payload::IssueCommentPayload;
pub use recording::{
    CorrelationId, Direction, EventType, RecordedEvent, RecordingLogger, RecordingMiddleware,
    Sanitizer, CORRELATION_ID_HEADER,
};
pub use state_machine::{Effect, Outcome, PhaseLabelConfig};
pub use tracker::{DryRunTracker, IssueTracker, TrackerError};
