/// Magic-phrase matching for issue comments
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ConfigurationError;

/// The workflow action a comment asks for.
///
/// Variants are declared in matching priority order; the derived `Ord`
/// follows that order, so iterating a `BTreeMap<ActionKind, _>` visits
/// phrases highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Volunteer to take the issue for its current phase
    Assign,
    /// Mark the current phase as done and advance
    Complete,
    /// Post results for phase 1 (reserved)
    Phase1Results,
    /// Post results for phase 2 (reserved)
    Phase2Results,
    /// Roll the issue back to an earlier phase (reserved)
    Unroll,
}

impl ActionKind {
    /// All kinds, highest priority first.
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Assign,
        ActionKind::Complete,
        ActionKind::Phase1Results,
        ActionKind::Phase2Results,
        ActionKind::Unroll,
    ];

    /// Name of the configuration input that carries this kind's phrase.
    ///
    /// Underscored, since Actions exposes an input as `INPUT_<NAME>` with
    /// hyphens kept.
    pub fn input_name(&self) -> &'static str {
        match self {
            ActionKind::Assign => "assign_phrase",
            ActionKind::Complete => "complete_phrase",
            ActionKind::Phase1Results => "phase1_results_phrase",
            ActionKind::Phase2Results => "phase2_results_phrase",
            ActionKind::Unroll => "unroll_phrase",
        }
    }

    /// Whether a deployment must configure a phrase for this kind.
    pub fn is_required(&self) -> bool {
        matches!(self, ActionKind::Assign | ActionKind::Complete)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Assign => write!(f, "assign"),
            ActionKind::Complete => write!(f, "complete"),
            ActionKind::Phase1Results => write!(f, "phase1-results"),
            ActionKind::Phase2Results => write!(f, "phase2-results"),
            ActionKind::Unroll => write!(f, "unroll"),
        }
    }
}

/// Trigger phrases keyed by the action they select.
///
/// Phrases are lower-cased on insertion, which is what lets [`match_phrase`]
/// compare against a lower-cased comment body without touching the phrases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhraseConfig {
    phrases: BTreeMap<ActionKind, String>,
}

impl PhraseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`PhraseConfig::insert`].
    pub fn with_phrase(mut self, kind: ActionKind, phrase: impl AsRef<str>) -> Self {
        self.insert(kind, phrase);
        self
    }

    /// Set the phrase for `kind`, replacing any previous one.
    pub fn insert(&mut self, kind: ActionKind, phrase: impl AsRef<str>) {
        self.phrases.insert(kind, phrase.as_ref().to_lowercase());
    }

    /// The normalized phrase for `kind`, if configured.
    pub fn phrase(&self, kind: ActionKind) -> Option<&str> {
        self.phrases.get(&kind).map(String::as_str)
    }

    /// Configured `(kind, phrase)` pairs in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (ActionKind, &str)> {
        self.phrases.iter().map(|(kind, phrase)| (*kind, phrase.as_str()))
    }

    /// Check that the required phrases are present and none is blank.
    ///
    /// A blank phrase is a substring of every comment, so it would turn
    /// every comment into a trigger.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for kind in ActionKind::ALL {
            match self.phrase(kind) {
                None if kind.is_required() => {
                    return Err(ConfigurationError::MissingPhrase { action: kind });
                }
                Some(phrase) if phrase.trim().is_empty() => {
                    return Err(ConfigurationError::EmptyPhrase { action: kind });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Find the action a comment body asks for.
///
/// The body is lower-cased and each configured phrase is tested for plain
/// substring containment, highest priority first. The first hit wins. Whole
/// words and punctuation are not considered, so a phrase buried mid-sentence
/// still matches.
pub fn match_phrase(body: &str, config: &PhraseConfig) -> Option<ActionKind> {
    let normalized = body.to_lowercase();

    config
        .iter()
        .filter(|(_, phrase)| !phrase.is_empty())
        .find(|(_, phrase)| normalized.contains(phrase))
        .map(|(kind, _)| kind)
}
