//! Phase model: where an issue sits in the configured label progression.
//!
//! Phases are plain issue labels. The configured sequence fixes their order;
//! any other label on the issue is ignored here.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::ConfigurationError;
use crate::issue::IssueSnapshot;

/// Ordered phase labels, earliest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseLabelConfig {
    labels: Vec<String>,
}

impl PhaseLabelConfig {
    /// Build a progression from labels in order.
    ///
    /// The sequence must be non-empty, every label non-blank, and no label may
    /// repeat: a repeated label would make `next_phase` ambiguous.
    pub fn new<I>(labels: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();

        if labels.is_empty() {
            return Err(ConfigurationError::NoPhaseLabels);
        }

        let mut seen = HashSet::new();
        for (position, label) in labels.iter().enumerate() {
            if label.trim().is_empty() {
                return Err(ConfigurationError::EmptyPhaseLabel { position });
            }
            if !seen.insert(label.as_str()) {
                return Err(ConfigurationError::DuplicatePhaseLabel {
                    label: label.clone(),
                });
            }
        }

        Ok(Self { labels })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// The phase at `index`, if the progression is that long.
    pub fn get(&self, index: usize) -> Option<Phase> {
        self.labels.get(index).map(|label| Phase {
            index,
            label: label.clone(),
        })
    }
}

/// A tracked phase: its label and its position in the progression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Phase {
    pub index: usize,
    pub label: String,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Result of locating an issue in the progression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrentPhase {
    Tracked(Phase),
    Untracked,
}

/// Result of asking for the phase after a given one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPhase {
    Phase(Phase),
    /// The given phase is the last configured one.
    Terminal,
}

/// Locate the issue's phase from its labels.
///
/// If several tracked labels are present, the earliest in configured order
/// wins.
pub fn current_phase(snapshot: &IssueSnapshot, phases: &PhaseLabelConfig) -> CurrentPhase {
    phases
        .labels
        .iter()
        .position(|label| snapshot.labels.contains(label))
        .and_then(|index| phases.get(index))
        .map_or(CurrentPhase::Untracked, CurrentPhase::Tracked)
}

/// The phase that follows `current`.
///
/// A `current` that is not part of `phases` (index out of range or label
/// mismatch) has no successor and yields `Terminal`.
pub fn next_phase(current: &Phase, phases: &PhaseLabelConfig) -> NextPhase {
    let in_sequence = phases
        .labels
        .get(current.index)
        .is_some_and(|label| *label == current.label);

    if !in_sequence {
        return NextPhase::Terminal;
    }

    phases
        .get(current.index + 1)
        .map_or(NextPhase::Terminal, NextPhase::Phase)
}
