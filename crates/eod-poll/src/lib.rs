//! EOD Poll
//!
//! Proposals that turn community votes into database changes.
//!
//! # Overview
//!
//! - **PollKind**: tagged union of every proposal, payload validated at
//!   construction
//! - **Poll**: vote tally plus status, one vote per user
//! - **PollStatus**: `pending -> {accepted, rejected, expired}`, one-way
//! - **Closure**: why a poll is leaving `pending`; [`Poll::resolve`] applies
//!   the change exactly once
//!
//! Polls carry no lock of their own. The owning game instance serializes
//! every call on a poll.

#![warn(missing_docs)]

pub mod error;
pub mod kind;
pub mod poll;
pub mod status;

// Re-exports
pub use error::PollError;
pub use kind::PollKind;
pub use poll::{Closure, Poll, Resolution, ResolutionReason, Vote};
pub use status::{allowed_transitions, validate_transition, PollStatus};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for poll handling
    pub use crate::{Closure, Poll, PollError, PollKind, PollStatus, Resolution, Vote};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
