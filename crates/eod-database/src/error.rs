//! Database errors

use eod_model::{Combination, ElementId, UserId};

/// Errors raised by [`crate::Database`]
///
/// Every mutating call that returns one of these has left the database
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatabaseError {
    /// No element with this name or id
    #[error("element not found: {0}")]
    ElementNotFound(String),

    /// Case-insensitive name collision on create
    #[error("an element named {0:?} already exists")]
    DuplicateName(String),

    /// User is not registered
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// Starter elements have no author and cannot take collaborators
    #[error("element {0} was not created by a user")]
    NotUserCreated(ElementId),

    /// User is already a collaborator
    #[error("user {user} already collaborates on {element}")]
    AlreadyCollaborator { element: ElementId, user: UserId },

    /// User is the element's author
    #[error("user {user} is the author of {element}")]
    IsAuthor { element: ElementId, user: UserId },

    /// The system account cannot be credited
    #[error("system account {0} cannot be a collaborator")]
    SystemAccount(UserId),

    /// User is not a collaborator
    #[error("user {user} does not collaborate on {element}")]
    NotCollaborator { element: ElementId, user: UserId },

    /// Collaborator cap would be exceeded
    #[error("element {element} would have {count} collaborators (max {max})")]
    TooManyCollaborators {
        element: ElementId,
        count: usize,
        max: usize,
    },

    /// The combination already produces something
    #[error("combination {combination} already makes {output}")]
    RecipeExists {
        combination: Combination,
        output: ElementId,
    },

    /// Snapshot failed invariant checks on restore
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    /// Broken internal invariant
    #[error("internal database error: {0}")]
    Internal(String),
}

impl DatabaseError {
    /// Whether this is a lookup miss
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ElementNotFound(_) | Self::UserNotFound(_))
    }

    /// Whether this is a conflict with current state, as opposed to a bug
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::DuplicateName(_)
                | Self::AlreadyCollaborator { .. }
                | Self::IsAuthor { .. }
                | Self::SystemAccount(_)
                | Self::NotCollaborator { .. }
                | Self::TooManyCollaborators { .. }
                | Self::RecipeExists { .. }
                | Self::NotUserCreated(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(DatabaseError::ElementNotFound("x".into()).is_not_found());
        assert!(DatabaseError::DuplicateName("x".into()).is_conflict());
        assert!(!DatabaseError::Internal("x".into()).is_conflict());
        assert!(!DatabaseError::Internal("x".into()).is_not_found());
    }

    #[test]
    fn display() {
        let err = DatabaseError::NotCollaborator {
            element: ElementId(3),
            user: UserId(9),
        };
        assert_eq!(err.to_string(), "user 9 does not collaborate on #3");
    }
}
