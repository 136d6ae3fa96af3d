//! Game instance: one community's graph and ruleset
//!
//! Lock order is fixed: the poll book mutex first, then the database lock
//! (taken inside [`Database`] calls). The database never calls back into the
//! poll book, so the two cannot deadlock. Every vote, admission and
//! resolution holds the poll book for its whole duration, which serializes
//! all poll-driven mutations of one community.

use crate::config::GameConfig;
use crate::error::GameError;
use crate::events::{GameEvent, EVENT_CAPACITY};
use eod_database::{Database, DatabaseSnapshot, ElementInfo};
use eod_model::{Combination, CommunityId, Element, PollId, User, UserId};
use eod_poll::{Closure, Poll, PollKind, Resolution, Vote};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::broadcast;

/// How an administrator closes a pending poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminClose {
    /// Close as rejected
    Reject,
    /// Close as expired
    Expire,
}

impl From<AdminClose> for Closure {
    fn from(value: AdminClose) -> Self {
        match value {
            AdminClose::Reject => Self::AdminRejected,
            AdminClose::Expire => Self::AdminExpired,
        }
    }
}

/// Result of a successful combination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombineOutcome {
    /// Element the recipe produces
    pub element: Element,
    /// False if the user already had it
    pub newly_found: bool,
}

/// Serializable state of one instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSnapshot {
    /// Community id
    pub community: CommunityId,
    /// Element graph and users
    pub database: DatabaseSnapshot,
    /// Polls still collecting votes
    pub pending: Vec<Poll>,
    /// Resolved polls
    pub history: Vec<Poll>,
    /// Next poll id to hand out
    pub next_poll_id: u64,
}

#[derive(Debug)]
struct PollBook {
    pending: BTreeMap<PollId, Poll>,
    history: BTreeMap<PollId, Poll>,
    next_id: u64,
}

impl PollBook {
    fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
            history: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn allocate(&mut self) -> Result<PollId, GameError> {
        let id = PollId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| GameError::Internal("poll id space exhausted".into()))?;
        Ok(id)
    }

    /// Error for a poll that is not pending
    fn not_pending(&self, id: PollId) -> GameError {
        match self.history.get(&id) {
            Some(poll) => GameError::AlreadyResolved {
                poll: id,
                status: poll.status(),
            },
            None => GameError::NotFound(id.to_string()),
        }
    }
}

/// One community's element graph, poll queue and ruleset
///
/// # Example
///
/// ```rust
/// use eod_core::{GameConfig, GameInstance};
/// use eod_model::{CommunityId, UserId};
/// use eod_poll::{Poll, PollKind, PollStatus};
///
/// let config = GameConfig::new().with_vote_req(2).with_poll_limit(1);
/// let game = GameInstance::new(CommunityId(1), config).unwrap();
///
/// let water = game.check_element("water").unwrap();
/// let poll = game
///     .suggest_poll(Poll::new(UserId(1), PollKind::color(&water, "#00ffaa").unwrap()))
///     .unwrap();
///
/// game.vote(poll.id(), UserId(2)).unwrap();
/// let poll = game.vote(poll.id(), UserId(3)).unwrap();
/// assert_eq!(poll.status(), PollStatus::Accepted);
/// assert_eq!(game.check_element("Water").unwrap().color.unwrap(), "#00ffaa");
/// ```
#[derive(Debug)]
pub struct GameInstance {
    community: CommunityId,
    config: GameConfig,
    db: Database,
    polls: Mutex<PollBook>,
    events: broadcast::Sender<GameEvent>,
}

impl GameInstance {
    /// Create an instance with a freshly seeded database
    ///
    /// # Errors
    /// `GameError::Config` if the config is invalid
    pub fn new(community: CommunityId, config: GameConfig) -> Result<Self, GameError> {
        config.validate()?;
        let db = Database::new(config.starter_names()?, config.system_user)?;
        tracing::info!(
            community = %community,
            vote_req = config.vote_req,
            poll_limit = config.poll_limit,
            "game instance created"
        );
        Ok(Self::assemble(community, config, db, PollBook::new()))
    }

    /// Rebuild an instance from a snapshot
    ///
    /// # Errors
    /// `GameError::Internal` if the snapshot is inconsistent
    pub fn from_snapshot(config: GameConfig, snapshot: InstanceSnapshot) -> Result<Self, GameError> {
        config.validate()?;
        let db = Database::from_snapshot(snapshot.database, config.system_user)?;

        let mut book = PollBook {
            pending: BTreeMap::new(),
            history: BTreeMap::new(),
            next_id: snapshot.next_poll_id,
        };
        let polls = snapshot
            .pending
            .into_iter()
            .map(|p| (p, true))
            .chain(snapshot.history.into_iter().map(|p| (p, false)));
        for (poll, pending) in polls {
            poll.validate()?;
            let id = poll.id();
            if id.get() >= book.next_id {
                return Err(GameError::Internal(format!(
                    "{id} is not below next poll id {}",
                    book.next_id
                )));
            }
            if poll.is_pending() != pending {
                return Err(GameError::Internal(format!("{id} is filed under the wrong list")));
            }
            if book.pending.contains_key(&id) || book.history.contains_key(&id) {
                return Err(GameError::Internal(format!("{id} listed twice")));
            }
            if pending {
                book.pending.insert(id, poll);
            } else {
                book.history.insert(id, poll);
            }
        }
        tracing::info!(
            community = %snapshot.community,
            pending = book.pending.len(),
            "game instance restored"
        );
        Ok(Self::assemble(snapshot.community, config, db, book))
    }

    fn assemble(community: CommunityId, config: GameConfig, db: Database, book: PollBook) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            community,
            config,
            db,
            polls: Mutex::new(book),
            events,
        }
    }

    /// Community id
    #[inline]
    #[must_use]
    pub fn community(&self) -> CommunityId {
        self.community
    }

    /// Ruleset, fixed at construction
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Underlying database, for read queries
    #[inline]
    #[must_use]
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Subscribe to this instance's events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Existing user, or a newly registered one with an empty inventory
    pub fn login_user(&self, id: UserId) -> User {
        self.db.login(id)
    }

    /// Resolve a user-supplied element reference
    ///
    /// # Errors
    /// `GameError::InvalidElement` if nothing matches
    pub fn check_element(&self, reference: &str) -> Result<Element, GameError> {
        self.db
            .lookup(reference)
            .map_err(|_| GameError::InvalidElement(reference.trim().to_string()))
    }

    /// Resolve several references, failing on the first bad one
    ///
    /// # Errors
    /// `GameError::InvalidElement` naming the first unknown reference
    pub fn check_elements<S: AsRef<str>>(&self, references: &[S]) -> Result<Vec<Element>, GameError> {
        references
            .iter()
            .map(|r| self.check_element(r.as_ref()))
            .collect()
    }

    /// Element info card as seen by `viewer`
    ///
    /// # Errors
    /// `GameError::InvalidElement` if nothing matches
    pub fn element_info(&self, reference: &str, viewer: Option<UserId>) -> Result<ElementInfo, GameError> {
        self.db
            .element_info(reference, viewer)
            .map_err(|_| GameError::InvalidElement(reference.trim().to_string()))
    }

    /// Admit a poll into the pending set
    ///
    /// With `vote_req == 0` the poll is accepted on admission and goes
    /// straight to history.
    ///
    /// # Errors
    /// - `GameError::PollLimit` if `poll_limit` polls are already pending
    /// - `GameError::Internal` for a poll that was already admitted or
    ///   carries votes or a result
    pub fn suggest_poll(&self, mut poll: Poll) -> Result<Poll, GameError> {
        poll.check_fresh()
            .map_err(|err| self.rejected(GameError::from(err)))?;
        self.db.login(poll.proposer());
        let mut events = Vec::with_capacity(2);
        {
            let mut book = self.polls.lock();
            if book.pending.len() >= self.config.poll_limit {
                return Err(self.rejected(GameError::PollLimit(self.config.poll_limit)));
            }
            let id = book.allocate()?;
            poll.admit(id)?;
            tracing::info!(
                community = %self.community,
                poll_id = %id,
                kind = poll.kind().label(),
                proposer = %poll.proposer(),
                "poll admitted"
            );
            events.push(GameEvent::PollAdmitted {
                community: self.community,
                poll: poll.clone(),
            });

            if poll.meets_accept(self.config.vote_req) {
                let resolution = poll.resolve(&self.db, Closure::Accept)?;
                events.push(self.resolved_event(&poll, &resolution));
                book.history.insert(id, poll.clone());
            } else {
                book.pending.insert(id, poll.clone());
            }
        }
        self.publish(events);
        Ok(poll)
    }

    /// Vote in favour of a pending poll
    ///
    /// Accepts and applies the poll when this vote reaches `vote_req`.
    /// Returns the poll as it stands after the vote.
    ///
    /// # Errors
    /// - `GameError::DuplicateVote` if `user` already voted
    /// - `GameError::AlreadyResolved` if the poll left pending first
    /// - `GameError::NotFound` for an unknown poll
    pub fn vote(&self, poll: PollId, user: UserId) -> Result<Poll, GameError> {
        self.cast(poll, user, Vote::For)
    }

    /// Vote against a pending poll
    ///
    /// Rejects the poll when this vote reaches `reject_req`.
    ///
    /// # Errors
    /// Same as [`GameInstance::vote`]
    pub fn downvote(&self, poll: PollId, user: UserId) -> Result<Poll, GameError> {
        self.cast(poll, user, Vote::Against)
    }

    fn cast(&self, poll_id: PollId, user: UserId, vote: Vote) -> Result<Poll, GameError> {
        self.db.login(user);
        let mut events = Vec::with_capacity(2);
        let poll = {
            let mut book = self.polls.lock();
            let Some(poll) = book.pending.get_mut(&poll_id) else {
                return Err(self.rejected(book.not_pending(poll_id)));
            };
            let reached = match vote {
                Vote::For => poll.cast_vote(user, self.config.vote_req),
                Vote::Against => poll.cast_downvote(user, self.config.reject_req),
            }
            .map_err(|e| self.rejected(e.into()))?;
            events.push(GameEvent::VoteCast {
                community: self.community,
                poll: poll_id,
                user,
                vote,
            });

            if reached {
                let closure = match vote {
                    Vote::For => Closure::Accept,
                    Vote::Against => Closure::Downvoted,
                };
                self.close_locked(&mut book, poll_id, closure, &mut events)?
            } else {
                poll.clone()
            }
        };
        self.publish(events);
        Ok(poll)
    }

    /// Force a pending poll closed
    ///
    /// Races safely with voting: whichever closes the poll first wins.
    ///
    /// # Errors
    /// `GameError::AlreadyResolved` if the poll already left pending
    pub fn close_poll(&self, poll_id: PollId, how: AdminClose) -> Result<Poll, GameError> {
        let mut events = Vec::with_capacity(1);
        let poll = {
            let mut book = self.polls.lock();
            if !book.pending.contains_key(&poll_id) {
                return Err(self.rejected(book.not_pending(poll_id)));
            }
            self.close_locked(&mut book, poll_id, how.into(), &mut events)?
        };
        self.publish(events);
        Ok(poll)
    }

    /// Expire every poll older than `poll_ttl_secs`
    ///
    /// # Errors
    /// `GameError::Internal` on a broken poll record
    pub fn expire_stale(&self) -> Result<Vec<Poll>, GameError> {
        self.expire_stale_at(chrono::Utc::now().timestamp())
    }

    /// [`GameInstance::expire_stale`] with an explicit clock
    ///
    /// # Errors
    /// `GameError::Internal` on a broken poll record
    pub fn expire_stale_at(&self, now: i64) -> Result<Vec<Poll>, GameError> {
        let Some(ttl) = self.config.poll_ttl_secs else {
            return Ok(Vec::new());
        };
        let mut events = Vec::new();
        let expired = {
            let mut book = self.polls.lock();
            let stale: Vec<PollId> = book
                .pending
                .values()
                .filter(|p| p.is_stale(now, ttl))
                .map(Poll::id)
                .collect();
            stale
                .into_iter()
                .map(|id| self.close_locked(&mut book, id, Closure::TimedOut, &mut events))
                .collect::<Result<Vec<_>, _>>()?
        };
        self.publish(events);
        Ok(expired)
    }

    /// Resolve a pending poll; caller holds the poll book
    fn close_locked(
        &self,
        book: &mut PollBook,
        poll_id: PollId,
        closure: Closure,
        events: &mut Vec<GameEvent>,
    ) -> Result<Poll, GameError> {
        let mut poll = book
            .pending
            .remove(&poll_id)
            .ok_or_else(|| GameError::Internal(format!("{poll_id} left the pending set early")))?;
        match poll.resolve(&self.db, closure) {
            Ok(resolution) => {
                events.push(self.resolved_event(&poll, &resolution));
                book.history.insert(poll_id, poll.clone());
                Ok(poll)
            }
            Err(err) => {
                tracing::error!(
                    community = %self.community,
                    poll_id = %poll_id,
                    error = %err,
                    "poll resolution failed"
                );
                book.pending.insert(poll_id, poll);
                Err(err.into())
            }
        }
    }

    /// Combine elements the user owns
    ///
    /// Starter elements count as owned. On success the output goes into
    /// the user's inventory.
    ///
    /// # Errors
    /// - `GameError::InvalidElement` for an unknown input
    /// - `GameError::NotOwned` if the user lacks an input
    /// - `GameError::NoRecipe` if nothing is made this way yet
    pub fn combine<S: AsRef<str>>(&self, user: UserId, names: &[S]) -> Result<CombineOutcome, GameError> {
        let inputs = self.check_elements(names)?;
        let combination = Combination::new(inputs.iter().map(|e| e.id))?;
        self.check_owned(user, &inputs)?;

        let element = self
            .db
            .find_recipe(&combination)
            .ok_or(GameError::NoRecipe(combination))?;
        let newly_found = self.db.grant(user, element.id)?;
        tracing::debug!(
            community = %self.community,
            user = %user,
            element = %element.name,
            newly_found,
            "combined"
        );
        if newly_found {
            self.publish(vec![GameEvent::ElementFound {
                community: self.community,
                user,
                element: element.clone(),
            }]);
        }
        Ok(CombineOutcome {
            element,
            newly_found,
        })
    }

    /// Propose what a combination should make
    ///
    /// Suggests a recipe to `result` when it names an existing element,
    /// otherwise a brand new element called `result`.
    ///
    /// # Errors
    /// - as [`GameInstance::combine`] for the inputs
    /// - `GameError::Conflict` if the combination already makes something
    /// - `GameError::PollLimit` from admission
    pub fn suggest_combination<S: AsRef<str>>(
        &self,
        proposer: UserId,
        names: &[S],
        result: &str,
    ) -> Result<Poll, GameError> {
        let inputs = self.check_elements(names)?;
        let combination = Combination::new(inputs.iter().map(|e| e.id))?;
        self.check_owned(proposer, &inputs)?;
        if let Some(output) = self.db.find_recipe(&combination) {
            return Err(GameError::Conflict(format!(
                "{combination} already makes {}",
                output.name
            )));
        }
        let kind = match self.db.lookup(result) {
            Ok(existing) => PollKind::new_recipe(&inputs, &existing)?,
            Err(_) => PollKind::new_element(&inputs, result)?,
        };
        self.suggest_poll(Poll::new(proposer, kind))
    }

    fn check_owned(&self, user: UserId, inputs: &[Element]) -> Result<(), GameError> {
        let player = self.db.login(user);
        match inputs
            .iter()
            .find(|e| !player.has(e.id) && !self.db.is_starter(e.id))
        {
            Some(missing) => Err(GameError::NotOwned {
                user,
                element: missing.name.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// A pending or resolved poll
    #[must_use]
    pub fn poll(&self, id: PollId) -> Option<Poll> {
        let book = self.polls.lock();
        book.pending.get(&id).or_else(|| book.history.get(&id)).cloned()
    }

    /// Pending polls ordered by id
    #[must_use]
    pub fn pending_polls(&self) -> Vec<Poll> {
        self.polls.lock().pending.values().cloned().collect()
    }

    /// Number of pending polls
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.polls.lock().pending.len()
    }

    /// Resolved polls ordered by id
    #[must_use]
    pub fn history(&self) -> Vec<Poll> {
        self.polls.lock().history.values().cloned().collect()
    }

    /// Capture polls and database together
    #[must_use]
    pub fn snapshot(&self) -> InstanceSnapshot {
        let book = self.polls.lock();
        InstanceSnapshot {
            community: self.community,
            database: self.db.snapshot(),
            pending: book.pending.values().cloned().collect(),
            history: book.history.values().cloned().collect(),
            next_poll_id: book.next_id,
        }
    }

    fn resolved_event(&self, poll: &Poll, resolution: &Resolution) -> GameEvent {
        GameEvent::PollResolved {
            community: self.community,
            poll: poll.clone(),
            element: resolution.applied.as_ref().map(|a| a.element().clone()),
        }
    }

    fn rejected(&self, err: GameError) -> GameError {
        tracing::warn!(community = %self.community, error = %err, "operation rejected");
        err
    }

    fn publish(&self, events: Vec<GameEvent>) {
        for event in events {
            // No subscribers is fine
            let _ = self.events.send(event);
        }
    }
}
