//! Testing utilities for EOD workspace
//!
//! Shared fixtures: configs, seeded instances, poll builders and stub
//! collaborator services.

#![allow(missing_docs)]

use async_trait::async_trait;
use eod_core::{GameConfig, GameError, GameInstance, IdentityResolver, ImageValidator};
use eod_model::{CommunityId, ElementName, ImageUrl, PayloadError, UserId};
use eod_poll::{Poll, PollKind};
use std::collections::HashSet;

pub const COMMUNITY: CommunityId = CommunityId(1);
pub const PROPOSER: UserId = UserId(100);
pub const BOT: UserId = UserId(9999);

/// Voters never colliding with [`PROPOSER`] or [`BOT`]
pub fn voters(n: u64) -> impl Iterator<Item = UserId> {
    (1..=n).map(UserId)
}

pub fn config(vote_req: usize, poll_limit: usize) -> GameConfig {
    GameConfig::new()
        .with_vote_req(vote_req)
        .with_poll_limit(poll_limit)
        .with_system_user(BOT)
}

/// Starter set without Fire
pub fn no_fire_config() -> GameConfig {
    config(1, 5).with_starters(["Air", "Earth", "Water"])
}

pub fn setup_instance(vote_req: usize, poll_limit: usize) -> GameInstance {
    GameInstance::new(COMMUNITY, config(vote_req, poll_limit)).unwrap()
}

pub fn mark_poll(game: &GameInstance, proposer: UserId, element: &str, text: &str) -> Poll {
    let element = game.check_element(element).unwrap();
    Poll::new(proposer, PollKind::mark(&element, text).unwrap())
}

pub fn color_poll(game: &GameInstance, proposer: UserId, element: &str, code: &str) -> Poll {
    let element = game.check_element(element).unwrap();
    Poll::new(proposer, PollKind::color(&element, code).unwrap())
}

pub fn new_element_poll(game: &GameInstance, proposer: UserId, inputs: &[&str], name: &str) -> Poll {
    let inputs = game.check_elements(inputs).unwrap();
    Poll::new(proposer, PollKind::new_element(&inputs, name).unwrap())
}

/// Push a poll through with fresh voters
pub fn accept(game: &GameInstance, poll: Poll) -> Poll {
    let mut poll = game.suggest_poll(poll).unwrap();
    let mut next = 1_000;
    while poll.is_pending() {
        next += 1;
        poll = game.vote(poll.id(), UserId(next)).unwrap();
    }
    poll
}

/// Create `name` from `inputs` with `author` as author
pub fn create_element(game: &GameInstance, author: UserId, inputs: &[&str], name: &str) -> ElementName {
    let poll = accept(game, new_element_poll(game, author, inputs, name));
    assert!(poll.status().is_terminal());
    game.check_element(name).unwrap().name
}

/// [`IdentityResolver`] knowing a fixed set of accounts
#[derive(Debug, Clone, Default)]
pub struct AllowListResolver {
    known: HashSet<u64>,
}

impl AllowListResolver {
    pub fn new(known: impl IntoIterator<Item = u64>) -> Self {
        Self {
            known: known.into_iter().collect(),
        }
    }
}

#[async_trait]
impl IdentityResolver for AllowListResolver {
    async fn exists(&self, id: UserId) -> bool {
        self.known.contains(&id.get())
    }
}

/// [`ImageValidator`] answering with a fixed content type, no network
#[derive(Debug, Clone)]
pub struct StaticImageValidator {
    content_type: String,
}

impl StaticImageValidator {
    pub fn new(content_type: &str) -> Self {
        Self {
            content_type: content_type.to_string(),
        }
    }

    pub fn png() -> Self {
        Self::new("image/png")
    }
}

#[async_trait]
impl ImageValidator for StaticImageValidator {
    async fn verify(&self, raw: &str) -> Result<ImageUrl, GameError> {
        let url = ImageUrl::parse(raw)?;
        if ImageUrl::is_supported_content_type(&self.content_type) {
            Ok(url)
        } else {
            Err(PayloadError::UnsupportedContentType(self.content_type.clone()).into())
        }
    }
}
