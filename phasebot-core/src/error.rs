//! Error types for the workflow engine.
//!
//! - `ConfigurationError`: bad trigger context or configuration. Always raised
//!   before any call reaches the issue tracker.
//! - `TrackerError`: a failed call to the issue tracker (see [`crate::tracker`]).
//! - `EngineError`: what an invocation returns when it cannot finish.

use thiserror::Error;

use crate::command::ActionKind;
use crate::state_machine::effect::Effect;
pub use crate::tracker::TrackerError;

/// Invalid event, payload or configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("unsupported event kind {actual:?}, expected {expected:?}")]
    UnsupportedEvent {
        expected: &'static str,
        actual: String,
    },

    #[error("no trigger phrase configured for {action} ({})", .action.input_name())]
    MissingPhrase { action: ActionKind },

    #[error("trigger phrase for {action} ({}) is empty", .action.input_name())]
    EmptyPhrase { action: ActionKind },

    #[error("no phase labels configured")]
    NoPhaseLabels,

    #[error("phase label at position {position} is empty")]
    EmptyPhaseLabel { position: usize },

    #[error("phase label {label:?} is configured more than once")]
    DuplicatePhaseLabel { label: String },

    #[error("event payload is missing required field `{field}`")]
    MissingField { field: &'static str },
}

/// Why an invocation stopped before producing an outcome.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A tracker call failed. `issued` holds the calls that had already
    /// succeeded; they are not rolled back.
    #[error("{source} (after {} completed call(s))", .issued.len())]
    Tracker {
        #[source]
        source: TrackerError,
        issued: Vec<Effect>,
    },
}

impl EngineError {
    /// Calls that were committed before the failure.
    pub fn issued(&self) -> &[Effect] {
        match self {
            EngineError::Configuration(_) => &[],
            EngineError::Tracker { issued, .. } => issued,
        }
    }
}
