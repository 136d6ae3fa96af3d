//! Poll errors

use crate::status::PollStatus;
use eod_model::{ElementId, PayloadError, PollId, UserId};

/// Errors raised while building, voting on or resolving a poll
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollError {
    /// User already voted on this poll
    #[error("user {user} already voted on {poll}")]
    DuplicateVote { poll: PollId, user: UserId },

    /// Poll left pending already
    #[error("{poll} is already {status}")]
    AlreadyResolved { poll: PollId, status: PollStatus },

    /// Status change not allowed by the state machine
    #[error("illegal poll transition: {from} -> {to}")]
    IllegalTransition { from: PollStatus, to: PollStatus },

    /// Poll was given an id twice
    #[error("{0} was already admitted")]
    AlreadyAdmitted(PollId),

    /// Voting or resolution before the poll has an id
    #[error("poll was never admitted")]
    NotAdmitted,

    /// Submitted poll already carries votes or a result
    #[error("poll is not fresh: {0}")]
    NotFresh(String),

    /// Collaborator polls need an element with an author
    #[error("element {0} was not created by a user")]
    NotUserCreated(ElementId),

    /// Payload failed validation
    #[error(transparent)]
    InvalidPayload(#[from] PayloadError),

    /// Restored poll record is inconsistent
    #[error("corrupt poll record {poll}: {reason}")]
    Corrupt { poll: PollId, reason: String },
}

impl PollError {
    /// Whether this indicates a caller bug rather than bad input or a race
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::AlreadyResolved { .. }
                | Self::IllegalTransition { .. }
                | Self::AlreadyAdmitted(_)
                | Self::NotAdmitted
                | Self::NotFresh(_)
                | Self::Corrupt { .. }
        )
    }
}
