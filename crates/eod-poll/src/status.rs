//! Poll status state machine
//!
//! `Pending` is the only non-terminal state. Every terminal state is
//! reachable from it exactly once and has no outgoing transitions.

use crate::error::PollError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollStatus {
    /// Collecting votes
    Pending,
    /// Mutation applied
    Accepted,
    /// Voted down, closed, or conflicted with the graph on apply
    Rejected,
    /// Timed out or closed without a verdict
    Expired,
}

impl PollStatus {
    /// All states
    pub const ALL: [Self; 4] = [Self::Pending, Self::Accepted, Self::Rejected, Self::Expired];

    /// Whether no further transition is possible
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for PollStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        })
    }
}

/// Validate a status transition
///
/// # Errors
/// `PollError::IllegalTransition` if `to` is not reachable from `from`
pub fn validate_transition(from: PollStatus, to: PollStatus) -> Result<(), PollError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(PollError::IllegalTransition { from, to })
    }
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: PollStatus) -> &'static [PollStatus] {
    use PollStatus::{Accepted, Expired, Pending, Rejected};
    match from {
        Pending => &[Accepted, Rejected, Expired],
        Accepted | Rejected | Expired => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_reaches_every_terminal_state() {
        for to in [PollStatus::Accepted, PollStatus::Rejected, PollStatus::Expired] {
            assert!(validate_transition(PollStatus::Pending, to).is_ok());
        }
        assert!(validate_transition(PollStatus::Pending, PollStatus::Pending).is_err());
    }

    #[test]
    fn terminal_states_are_final() {
        for from in PollStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
            assert!(allowed_transitions(from).is_empty());
            for to in PollStatus::ALL {
                assert_eq!(
                    validate_transition(from, to),
                    Err(PollError::IllegalTransition { from, to })
                );
            }
        }
    }

    #[test]
    fn display() {
        assert_eq!(PollStatus::Accepted.to_string(), "accepted");
    }
}
