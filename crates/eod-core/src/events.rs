//! Game events
//!
//! Published on a broadcast channel after every lock is released, so a slow
//! subscriber never holds up voting.

use eod_model::{CommunityId, Element, PollId, UserId};
use eod_poll::{Poll, Vote};

/// Default broadcast buffer per instance
pub const EVENT_CAPACITY: usize = 256;

/// Something the presentation layer may want to announce
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// A poll entered the pending set
    PollAdmitted { community: CommunityId, poll: Poll },
    /// A vote was recorded on a pending poll
    VoteCast {
        community: CommunityId,
        poll: PollId,
        user: UserId,
        vote: Vote,
    },
    /// A poll left pending
    PollResolved {
        community: CommunityId,
        poll: Poll,
        /// Element created or changed, when accepted
        element: Option<Element>,
    },
    /// A user found an element by combining
    ElementFound {
        community: CommunityId,
        user: UserId,
        element: Element,
    },
}

impl GameEvent {
    /// Community the event belongs to
    #[must_use]
    pub fn community(&self) -> CommunityId {
        match self {
            Self::PollAdmitted { community, .. }
            | Self::VoteCast { community, .. }
            | Self::PollResolved { community, .. }
            | Self::ElementFound { community, .. } => *community,
        }
    }
}
