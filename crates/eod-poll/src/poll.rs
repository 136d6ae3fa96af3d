//! Poll record and resolution

use crate::error::PollError;
use crate::kind::PollKind;
use crate::status::{validate_transition, PollStatus};
use eod_database::{Applied, Database};
use eod_model::{PollId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Direction of a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vote {
    /// In favour
    For,
    /// Against
    Against,
}

/// Why a pending poll is being closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closure {
    /// Enough votes in favour; apply the change
    Accept,
    /// Enough votes against
    Downvoted,
    /// Administrator closed it as rejected
    AdminRejected,
    /// Administrator closed it as expired
    AdminExpired,
    /// Time to live elapsed
    TimedOut,
}

impl Closure {
    /// Status the poll moves to, assuming an accepted change applies cleanly
    #[must_use]
    pub fn intended_status(self) -> PollStatus {
        match self {
            Self::Accept => PollStatus::Accepted,
            Self::Downvoted | Self::AdminRejected => PollStatus::Rejected,
            Self::AdminExpired | Self::TimedOut => PollStatus::Expired,
        }
    }
}

/// Recorded reason a poll left pending
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum ResolutionReason {
    /// Accepted and applied
    Approved,
    /// Reject threshold reached
    Downvoted,
    /// Closed by an administrator as rejected
    AdminRejected,
    /// Closed by an administrator as expired
    AdminExpired,
    /// Time to live elapsed
    TimedOut,
    /// Accepted, but the change no longer fit the graph
    Conflict(String),
}

impl ResolutionReason {
    /// Terminal status matching this reason
    #[must_use]
    pub fn status(&self) -> PollStatus {
        match self {
            Self::Approved => PollStatus::Accepted,
            Self::Downvoted | Self::AdminRejected | Self::Conflict(_) => PollStatus::Rejected,
            Self::AdminExpired | Self::TimedOut => PollStatus::Expired,
        }
    }
}

/// Outcome of [`Poll::resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Resolved poll
    pub poll: PollId,
    /// Final status
    pub status: PollStatus,
    /// Why it ended
    pub reason: ResolutionReason,
    /// Database change, when accepted
    pub applied: Option<Applied>,
}

/// A proposed change collecting votes
///
/// A poll is built with [`Poll::new`], given its id on admission, and leaves
/// `Pending` exactly once through [`Poll::resolve`].
///
/// # Example
///
/// ```rust
/// use eod_database::Database;
/// use eod_model::{ElementName, PollId, UserId};
/// use eod_poll::{Closure, Poll, PollKind, PollStatus};
///
/// let db = Database::new([ElementName::new("Water").unwrap()], None).unwrap();
/// let water = db.lookup("water").unwrap();
///
/// let mut poll = Poll::new(UserId(1), PollKind::color(&water, "#00ffaa").unwrap());
/// poll.admit(PollId(1)).unwrap();
///
/// assert!(!poll.cast_vote(UserId(2), 2).unwrap());
/// assert!(poll.cast_vote(UserId(3), 2).unwrap());
///
/// let resolution = poll.resolve(&db, Closure::Accept).unwrap();
/// assert_eq!(resolution.status, PollStatus::Accepted);
/// assert_eq!(db.lookup("Water").unwrap().color.unwrap(), "#00ffaa");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    id: PollId,
    kind: PollKind,
    proposer: UserId,
    votes_for: BTreeSet<UserId>,
    votes_against: BTreeSet<UserId>,
    status: PollStatus,
    created: i64,
    resolution: Option<ResolutionReason>,
    resolved_at: Option<i64>,
}

impl Poll {
    /// Build an unadmitted poll
    #[must_use]
    pub fn new(proposer: UserId, kind: PollKind) -> Self {
        Self {
            id: PollId(0),
            kind,
            proposer,
            votes_for: BTreeSet::new(),
            votes_against: BTreeSet::new(),
            status: PollStatus::Pending,
            created: chrono::Utc::now().timestamp(),
            resolution: None,
            resolved_at: None,
        }
    }

    /// Backdate creation; for replaying stored polls and expiry tests
    #[inline]
    #[must_use]
    pub fn with_created(mut self, created: i64) -> Self {
        self.created = created;
        self
    }

    /// Assign the id handed out on admission
    ///
    /// # Errors
    /// Same as [`Poll::check_fresh`]
    pub fn admit(&mut self, id: PollId) -> Result<(), PollError> {
        self.check_fresh()?;
        self.id = id;
        Ok(())
    }

    /// Check the poll can still be admitted
    ///
    /// # Errors
    /// - `PollError::AlreadyAdmitted` if the poll already has an id
    /// - `PollError::NotFresh` if it carries votes or a result
    pub fn check_fresh(&self) -> Result<(), PollError> {
        if self.is_admitted() {
            return Err(PollError::AlreadyAdmitted(self.id));
        }
        if !self.is_pending() || self.resolution.is_some() {
            return Err(PollError::NotFresh(format!("status is {}", self.status)));
        }
        if !self.votes_for.is_empty() || !self.votes_against.is_empty() {
            return Err(PollError::NotFresh(format!(
                "{} votes cast before admission",
                self.votes_for.len() + self.votes_against.len()
            )));
        }
        Ok(())
    }

    /// Whether an id has been assigned
    #[inline]
    #[must_use]
    pub fn is_admitted(&self) -> bool {
        self.id.get() != 0
    }

    /// Poll id; `poll-0` until admitted
    #[inline]
    #[must_use]
    pub fn id(&self) -> PollId {
        self.id
    }

    /// Proposed change
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &PollKind {
        &self.kind
    }

    /// Proposing user
    #[inline]
    #[must_use]
    pub fn proposer(&self) -> UserId {
        self.proposer
    }

    /// Current status
    #[inline]
    #[must_use]
    pub fn status(&self) -> PollStatus {
        self.status
    }

    /// Whether still collecting votes
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == PollStatus::Pending
    }

    /// Unix timestamp of construction
    #[inline]
    #[must_use]
    pub fn created(&self) -> i64 {
        self.created
    }

    /// Why the poll ended, once resolved
    #[inline]
    #[must_use]
    pub fn resolution(&self) -> Option<&ResolutionReason> {
        self.resolution.as_ref()
    }

    /// When the poll ended, once resolved
    #[inline]
    #[must_use]
    pub fn resolved_at(&self) -> Option<i64> {
        self.resolved_at
    }

    /// Number of votes in favour
    #[inline]
    #[must_use]
    pub fn votes_for(&self) -> usize {
        self.votes_for.len()
    }

    /// Number of votes against
    #[inline]
    #[must_use]
    pub fn votes_against(&self) -> usize {
        self.votes_against.len()
    }

    /// Whether `user` has voted either way
    #[must_use]
    pub fn has_voted(&self, user: UserId) -> bool {
        self.votes_for.contains(&user) || self.votes_against.contains(&user)
    }

    /// How `user` voted, if at all
    #[must_use]
    pub fn vote_of(&self, user: UserId) -> Option<Vote> {
        if self.votes_for.contains(&user) {
            Some(Vote::For)
        } else if self.votes_against.contains(&user) {
            Some(Vote::Against)
        } else {
            None
        }
    }

    /// Whether the accept threshold is met
    #[inline]
    #[must_use]
    pub fn meets_accept(&self, vote_req: usize) -> bool {
        self.votes_for.len() >= vote_req
    }

    /// Whether the reject threshold, if any, is met
    #[inline]
    #[must_use]
    pub fn meets_reject(&self, reject_req: Option<usize>) -> bool {
        reject_req.is_some_and(|req| self.votes_against.len() >= req)
    }

    /// Whether the poll has outlived `ttl_secs` at `now`
    #[must_use]
    pub fn is_stale(&self, now: i64, ttl_secs: u64) -> bool {
        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        now.saturating_sub(self.created) >= ttl
    }

    fn record(&mut self, user: UserId, vote: Vote) -> Result<(), PollError> {
        if !self.is_admitted() {
            return Err(PollError::NotAdmitted);
        }
        if self.status.is_terminal() {
            return Err(PollError::AlreadyResolved {
                poll: self.id,
                status: self.status,
            });
        }
        if self.has_voted(user) {
            return Err(PollError::DuplicateVote {
                poll: self.id,
                user,
            });
        }
        match vote {
            Vote::For => self.votes_for.insert(user),
            Vote::Against => self.votes_against.insert(user),
        };
        tracing::debug!(
            poll_id = %self.id,
            user = %user,
            ?vote,
            votes_for = self.votes_for.len(),
            votes_against = self.votes_against.len(),
            "vote recorded"
        );
        Ok(())
    }

    /// Record a vote in favour
    ///
    /// Returns whether the accept threshold is now met. The caller resolves
    /// the poll; this never changes status.
    ///
    /// # Errors
    /// - `PollError::NotAdmitted` before admission
    /// - `PollError::DuplicateVote` if `user` already voted either way
    /// - `PollError::AlreadyResolved` if the poll is not pending
    pub fn cast_vote(&mut self, user: UserId, vote_req: usize) -> Result<bool, PollError> {
        self.record(user, Vote::For)?;
        Ok(self.meets_accept(vote_req))
    }

    /// Record a vote against
    ///
    /// Returns whether the reject threshold is now met; always false when
    /// there is no reject threshold.
    ///
    /// # Errors
    /// Same as [`Poll::cast_vote`]
    pub fn cast_downvote(
        &mut self,
        user: UserId,
        reject_req: Option<usize>,
    ) -> Result<bool, PollError> {
        self.record(user, Vote::Against)?;
        Ok(self.meets_reject(reject_req))
    }

    /// Leave `Pending`
    ///
    /// On [`Closure::Accept`] the change is applied to `db`. If the database
    /// refuses it (a name taken meanwhile, a collaborator already added by an
    /// earlier poll) the poll is rejected instead and nothing is written.
    ///
    /// # Errors
    /// `PollError::NotAdmitted` before admission, `PollError::AlreadyResolved`
    /// if the poll already left `Pending`; both are caller bugs
    pub fn resolve(&mut self, db: &Database, closure: Closure) -> Result<Resolution, PollError> {
        if !self.is_admitted() {
            return Err(PollError::NotAdmitted);
        }
        if self.status.is_terminal() {
            return Err(PollError::AlreadyResolved {
                poll: self.id,
                status: self.status,
            });
        }
        validate_transition(self.status, closure.intended_status())?;

        let (reason, applied) = match closure {
            Closure::Accept => {
                match db.apply_mutation(&self.kind.to_mutation(self.proposer)) {
                    Ok(applied) => (ResolutionReason::Approved, Some(applied)),
                    Err(err) => {
                        tracing::warn!(
                            poll_id = %self.id,
                            kind = self.kind.label(),
                            error = %err,
                            "accepted poll no longer applies"
                        );
                        (ResolutionReason::Conflict(err.to_string()), None)
                    }
                }
            }
            Closure::Downvoted => (ResolutionReason::Downvoted, None),
            Closure::AdminRejected => (ResolutionReason::AdminRejected, None),
            Closure::AdminExpired => (ResolutionReason::AdminExpired, None),
            Closure::TimedOut => (ResolutionReason::TimedOut, None),
        };

        let status = reason.status();
        self.status = status;
        self.resolution = Some(reason.clone());
        self.resolved_at = Some(chrono::Utc::now().timestamp());

        tracing::info!(
            poll_id = %self.id,
            kind = self.kind.label(),
            %status,
            votes_for = self.votes_for.len(),
            votes_against = self.votes_against.len(),
            "poll resolved"
        );
        Ok(Resolution {
            poll: self.id,
            status,
            reason,
            applied,
        })
    }

    /// Check a restored record is self-consistent
    ///
    /// # Errors
    /// `PollError::Corrupt` describing the inconsistency
    pub fn validate(&self) -> Result<(), PollError> {
        let corrupt = |reason: &str| PollError::Corrupt {
            poll: self.id,
            reason: reason.to_string(),
        };
        if !self.is_admitted() {
            return Err(corrupt("poll was never admitted"));
        }
        if self.votes_for.intersection(&self.votes_against).next().is_some() {
            return Err(corrupt("a user voted both ways"));
        }
        match (&self.resolution, self.status) {
            (None, PollStatus::Pending) => Ok(()),
            (Some(reason), status) if reason.status() == status => Ok(()),
            _ => Err(corrupt("status does not match resolution")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eod_model::ElementName;
    use pretty_assertions::assert_eq;

    fn db() -> Database {
        Database::new(
            ["Air", "Earth", "Fire", "Water"].map(|n| ElementName::new(n).unwrap()),
            None,
        )
        .unwrap()
    }

    fn color_poll(db: &Database) -> Poll {
        let water = db.lookup("Water").unwrap();
        let mut poll = Poll::new(UserId(1), PollKind::color(&water, "#00ffaa").unwrap());
        poll.admit(PollId(1)).unwrap();
        poll
    }

    #[test]
    fn duplicate_vote_does_not_count() {
        let db = db();
        let mut poll = color_poll(&db);
        assert!(!poll.cast_vote(UserId(2), 3).unwrap());
        assert_eq!(
            poll.cast_vote(UserId(2), 3).unwrap_err(),
            PollError::DuplicateVote {
                poll: PollId(1),
                user: UserId(2)
            }
        );
        assert_eq!(
            poll.cast_downvote(UserId(2), None).unwrap_err(),
            PollError::DuplicateVote {
                poll: PollId(1),
                user: UserId(2)
            }
        );
        assert_eq!(poll.votes_for(), 1);
        assert_eq!(poll.votes_against(), 0);
    }

    #[test]
    fn proposer_may_vote() {
        let db = db();
        let mut poll = color_poll(&db);
        assert!(poll.cast_vote(UserId(1), 1).unwrap());
        assert_eq!(poll.vote_of(UserId(1)), Some(Vote::For));
    }

    #[test]
    fn downvotes_without_threshold_never_reject() {
        let db = db();
        let mut poll = color_poll(&db);
        for user in 2..20 {
            assert!(!poll.cast_downvote(UserId(user), None).unwrap());
        }
        assert!(poll.is_pending());
    }

    #[test]
    fn resolving_twice_is_an_error() {
        let db = db();
        let mut poll = color_poll(&db);
        poll.resolve(&db, Closure::Accept).unwrap();
        let err = poll.resolve(&db, Closure::Accept).unwrap_err();
        assert_eq!(
            err,
            PollError::AlreadyResolved {
                poll: PollId(1),
                status: PollStatus::Accepted
            }
        );
        assert!(err.is_internal());
        assert!(poll.cast_vote(UserId(5), 1).is_err());
    }

    #[test]
    fn rejection_leaves_database_untouched() {
        let db = db();
        let mut poll = color_poll(&db);
        let resolution = poll.resolve(&db, Closure::AdminRejected).unwrap();
        assert_eq!(resolution.status, PollStatus::Rejected);
        assert!(resolution.applied.is_none());
        assert!(db.lookup("Water").unwrap().color.is_none());
    }

    #[test]
    fn conflict_on_apply_rejects() {
        let db = db();
        let inputs = db.lookup_all(["Fire", "Water"]).unwrap();
        let mut first = Poll::new(UserId(1), PollKind::new_element(&inputs, "Steam").unwrap());
        first.admit(PollId(1)).unwrap();
        let mut second = Poll::new(UserId(2), PollKind::new_element(&inputs, "Vapor").unwrap());
        second.admit(PollId(2)).unwrap();

        assert_eq!(
            first.resolve(&db, Closure::Accept).unwrap().status,
            PollStatus::Accepted
        );
        let resolution = second.resolve(&db, Closure::Accept).unwrap();
        assert_eq!(resolution.status, PollStatus::Rejected);
        assert!(matches!(resolution.reason, ResolutionReason::Conflict(_)));
        assert!(!db.has_element("Vapor"));
        assert!(db.user(UserId(1)).unwrap().has(db.lookup("Steam").unwrap().id));
    }

    #[test]
    fn admission_happens_once() {
        let db = db();
        let mut poll = color_poll(&db);
        assert_eq!(
            poll.admit(PollId(9)).unwrap_err(),
            PollError::AlreadyAdmitted(PollId(1))
        );
    }

    #[test]
    fn unadmitted_poll_takes_no_votes() {
        let db = db();
        let water = db.lookup("Water").unwrap();
        let mut poll = Poll::new(UserId(1), PollKind::color(&water, "#00ffaa").unwrap());

        assert_eq!(poll.cast_vote(UserId(2), 1).unwrap_err(), PollError::NotAdmitted);
        assert_eq!(
            poll.cast_downvote(UserId(3), Some(1)).unwrap_err(),
            PollError::NotAdmitted
        );
        assert_eq!(poll.votes_for(), 0);
        assert_eq!(poll.votes_against(), 0);
        assert!(poll.check_fresh().is_ok());
    }

    #[test]
    fn unadmitted_poll_cannot_resolve() {
        let db = db();
        let water = db.lookup("Water").unwrap();
        let mut poll = Poll::new(UserId(1), PollKind::color(&water, "#00ffaa").unwrap());

        let err = poll.resolve(&db, Closure::Accept).unwrap_err();
        assert_eq!(err, PollError::NotAdmitted);
        assert!(err.is_internal());
        assert!(poll.is_pending());
        assert!(db.lookup("Water").unwrap().color.is_none());
    }

    #[test]
    fn forged_votes_block_admission() {
        let db = db();
        let water = db.lookup("Water").unwrap();
        let poll = Poll::new(UserId(1), PollKind::color(&water, "#00ffaa").unwrap());
        let json = serde_json::to_string(&poll)
            .unwrap()
            .replace("\"votes_for\":[]", "\"votes_for\":[10,11,12]");
        let mut forged: Poll = serde_json::from_str(&json).unwrap();
        assert_eq!(forged.votes_for(), 3);

        assert!(matches!(forged.admit(PollId(4)), Err(PollError::NotFresh(_))));
        assert!(!forged.is_admitted());
    }

    #[test]
    fn staleness() {
        let db = db();
        let poll = color_poll(&db).with_created(1_000);
        assert!(!poll.is_stale(1_059, 60));
        assert!(poll.is_stale(1_060, 60));
    }

    #[test]
    fn validate_restored_record() {
        let db = db();
        let mut poll = color_poll(&db);
        poll.cast_vote(UserId(2), 5).unwrap();
        assert!(poll.validate().is_ok());

        let json = serde_json::to_string(&poll).unwrap();
        let tampered = json.replace("\"votes_against\":[]", "\"votes_against\":[2]");
        let tampered: Poll = serde_json::from_str(&tampered).unwrap();
        assert!(matches!(tampered.validate(), Err(PollError::Corrupt { .. })));
    }
}
