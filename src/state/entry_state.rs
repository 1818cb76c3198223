//! Entry attempt state definitions
//!
//! One attempt exists per discovered listing and is dropped once it reaches a
//! terminal state.

use crate::GiveawayError;
use std::fmt;

/// Represents the current state of one giveaway entry attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryAttemptState {
    // ===== Active States =====
    /// Fetching the entry page and choosing the confirmation URL
    Selecting,

    /// Posting the CSRF token and submitting the entry form
    Confirming,

    // ===== Terminal States =====
    /// The entry form was submitted; the entry is committed server-side
    Accepted,

    /// No actionable path on the page (already entered, unknown shape)
    Abandoned,

    /// A request failed; the attempt stops without retry
    Failed,
}

impl EntryAttemptState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Selecting | Self::Confirming)
    }

    /// Returns true if this represents a committed entry
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Returns true if `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: EntryAttemptState) -> bool {
        match (self, next) {
            (Self::Selecting, Self::Confirming) => true,
            (Self::Confirming, Self::Accepted) => true,
            (s, Self::Abandoned | Self::Failed) => !s.is_terminal(),
            _ => false,
        }
    }

    /// Moves to `next`, rejecting illegal transitions
    pub fn advance(self, next: EntryAttemptState) -> Result<EntryAttemptState, GiveawayError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(GiveawayError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }

    /// Stable lowercase name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Selecting => "selecting",
            Self::Confirming => "confirming",
            Self::Accepted => "accepted",
            Self::Abandoned => "abandoned",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for EntryAttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
