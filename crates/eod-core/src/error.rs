//! Error types for EOD Core
//!
//! [`GameError`] is what the command layer sees. It groups into:
//! - validation failures, shown to the user as-is
//! - rejected operations (duplicate vote, full poll queue, losing a race)
//! - internal errors, which abort the single operation and get logged

use crate::config::ConfigError;
use eod_database::DatabaseError;
use eod_model::{Combination, CommunityId, ElementId, PayloadError, PollId, UserId};
use eod_poll::{PollError, PollStatus};

/// Main game error type
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// Element, poll or instance absent
    #[error("not found: {0}")]
    NotFound(String),

    /// User-supplied element reference does not resolve
    #[error("not a valid element: {0:?}")]
    InvalidElement(String),

    /// Name collision on create
    #[error("an element named {0:?} already exists")]
    DuplicateName(String),

    /// Same user voting twice
    #[error("user {user} already voted on {poll}")]
    DuplicateVote { poll: PollId, user: UserId },

    /// Too many pending polls
    #[error("poll limit reached (max: {0})")]
    PollLimit(usize),

    /// Malformed payload
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] PayloadError),

    /// Collaborator change on an element nobody authored
    #[error("element {0} was not created by a user")]
    NotUserCreated(ElementId),

    /// No recipe for this combination yet
    #[error("no recipe for {0}")]
    NoRecipe(Combination),

    /// Combining elements the user does not own
    #[error("user {user} does not have {element:?}")]
    NotOwned { user: UserId, element: String },

    /// Change conflicts with the current graph
    #[error("conflict: {0}")]
    Conflict(String),

    /// Image link failed the external check
    #[error("image check failed: {0}")]
    ImageCheck(String),

    /// Poll already left pending; this caller lost the race
    #[error("{poll} is already {status}")]
    AlreadyResolved { poll: PollId, status: PollStatus },

    /// Community registered twice
    #[error("instance already exists for community {0}")]
    InstanceExists(CommunityId),

    /// Configuration problem
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Broken invariant
    #[error("internal error: {0}")]
    Internal(String),
}

impl GameError {
    /// Whether this is a broken invariant
    #[inline]
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_) | Self::InstanceExists(_))
    }

    /// Whether this is a validation failure to report back to the user
    #[inline]
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::InvalidElement(_)
                | Self::DuplicateName(_)
                | Self::InvalidPayload(_)
                | Self::NotUserCreated(_)
                | Self::NoRecipe(_)
                | Self::NotOwned { .. }
                | Self::Conflict(_)
                | Self::ImageCheck(_)
        )
    }

    /// Whether this is an expected race or capacity outcome
    #[inline]
    #[must_use]
    pub fn is_rejected_operation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateVote { .. } | Self::PollLimit(_) | Self::AlreadyResolved { .. }
        )
    }
}

impl From<DatabaseError> for GameError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ElementNotFound(what) => Self::NotFound(what),
            DatabaseError::UserNotFound(user) => Self::NotFound(format!("user {user}")),
            DatabaseError::DuplicateName(name) => Self::DuplicateName(name),
            DatabaseError::NotUserCreated(id) => Self::NotUserCreated(id),
            DatabaseError::CorruptSnapshot(_) | DatabaseError::Internal(_) => {
                Self::Internal(err.to_string())
            }
            other => Self::Conflict(other.to_string()),
        }
    }
}

impl From<PollError> for GameError {
    fn from(err: PollError) -> Self {
        match err {
            PollError::DuplicateVote { poll, user } => Self::DuplicateVote { poll, user },
            PollError::InvalidPayload(payload) => Self::InvalidPayload(payload),
            PollError::NotUserCreated(id) => Self::NotUserCreated(id),
            // Only fresh polls are admitted, and each is resolved once after admission
            PollError::AlreadyResolved { .. }
            | PollError::IllegalTransition { .. }
            | PollError::AlreadyAdmitted(_)
            | PollError::NotAdmitted
            | PollError::NotFresh(_)
            | PollError::Corrupt { .. } => Self::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_disjoint() {
        let errors = [
            GameError::NotFound("x".into()),
            GameError::PollLimit(21),
            GameError::Internal("boom".into()),
            GameError::DuplicateVote {
                poll: PollId(1),
                user: UserId(2),
            },
        ];
        for err in &errors {
            let classes = [
                err.is_internal(),
                err.is_user_facing(),
                err.is_rejected_operation(),
            ];
            assert_eq!(classes.iter().filter(|c| **c).count(), 1, "{err}");
        }
    }

    #[test]
    fn database_errors_map_into_taxonomy() {
        assert!(matches!(
            GameError::from(DatabaseError::DuplicateName("Fire".into())),
            GameError::DuplicateName(n) if n == "Fire"
        ));
        assert!(GameError::from(DatabaseError::Internal("x".into())).is_internal());
        assert!(GameError::from(DatabaseError::AlreadyCollaborator {
            element: ElementId(5),
            user: UserId(2)
        })
        .is_user_facing());
    }

    #[test]
    fn double_resolve_is_internal() {
        let err = GameError::from(PollError::AlreadyResolved {
            poll: PollId(3),
            status: PollStatus::Accepted,
        });
        assert!(err.is_internal());
    }

    #[test]
    fn stale_submission_is_internal() {
        assert!(GameError::from(PollError::NotAdmitted).is_internal());
        assert!(GameError::from(PollError::NotFresh("2 votes cast before admission".into()))
            .is_internal());
    }

    #[test]
    fn display() {
        assert_eq!(
            GameError::PollLimit(21).to_string(),
            "poll limit reached (max: 21)"
        );
    }
}
