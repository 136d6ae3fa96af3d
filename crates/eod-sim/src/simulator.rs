//! Concurrent voting simulator
//!
//! Drives several communities at once through seeded waves of polls. Each
//! wave admits polls until the queue refuses one, fires a burst of votes,
//! downvotes and admin closes from blocking worker threads, then audits the
//! outcome:
//! - every accepted poll was applied exactly once
//! - no rejected or expired poll touched the graph
//! - the stored vote sets match the votes the instance acknowledged
//! - nothing is left pending

use eod_core::{AdminClose, GameConfig, GameError, GameEvent, GameInstance, InstanceManager, ManagerConfig};
use eod_model::{CommunityId, PollId, UserId};
use eod_poll::{Poll, PollKind, PollStatus};
use futures::future::join_all;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Actions per wave
const WAVE_ACTIONS: usize = 96;

/// Polls per wave
const MAX_WAVE_POLLS: usize = 64;

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Communities simulated side by side
    pub communities: u64,
    /// Distinct voters per community
    pub users: u64,
    /// Polls proposed per community
    pub polls: u64,
    /// Accept threshold
    pub vote_req: usize,
    /// Downvote threshold
    pub reject_req: Option<usize>,
    /// Pending poll cap
    pub poll_limit: usize,
    /// Stop a community at its first violation
    pub stop_on_first_violation: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            communities: 4,
            users: 12,
            polls: 40,
            vote_req: 3,
            reject_req: Some(3),
            poll_limit: 8,
            stop_on_first_violation: false,
        }
    }
}

impl SimulatorConfig {
    /// Ruleset every simulated community runs with
    #[must_use]
    pub fn game_config(&self) -> GameConfig {
        let config = GameConfig::new()
            .with_vote_req(self.vote_req)
            .with_poll_limit(self.poll_limit);
        match self.reject_req {
            Some(req) => config.with_reject_req(req),
            None => config,
        }
    }
}

/// One simulated request against an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedAction {
    /// Vote in favour
    Vote(PollId, UserId),
    /// Vote against
    Downvote(PollId, UserId),
    /// Administrator close
    Close(PollId, AdminClose),
}

impl SimulatedAction {
    fn poll(self) -> PollId {
        match self {
            Self::Vote(poll, _) | Self::Downvote(poll, _) | Self::Close(poll, _) => poll,
        }
    }

    fn run(self, game: &GameInstance) -> Result<Poll, GameError> {
        match self {
            Self::Vote(poll, user) => game.vote(poll, user),
            Self::Downvote(poll, user) => game.downvote(poll, user),
            Self::Close(poll, how) => game.close_poll(poll, how),
        }
    }
}

/// A broken guarantee found while auditing a wave
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Accepted poll applied more than once
    AppliedTwice {
        community: CommunityId,
        poll: PollId,
        times: usize,
    },
    /// Accepted poll never applied
    AcceptedNotApplied { community: CommunityId, poll: PollId },
    /// Graph changed by a poll that was not accepted
    AppliedWithoutAcceptance {
        community: CommunityId,
        poll: PollId,
        status: PollStatus,
    },
    /// Instance acknowledged the same voter twice
    DoubleCounted {
        community: CommunityId,
        poll: PollId,
        user: UserId,
    },
    /// Stored votes differ from acknowledged votes
    VoteCountMismatch {
        community: CommunityId,
        poll: PollId,
        acknowledged: usize,
        stored: usize,
    },
    /// More votes than the threshold that closes the poll
    ThresholdOvershoot {
        community: CommunityId,
        poll: PollId,
        votes: usize,
    },
    /// Poll still pending after its wave was closed out
    LeftPending { community: CommunityId, poll: PollId },
    /// Events dropped, so the audit is incomplete
    EventsLagged { community: CommunityId, missed: u64 },
    /// Operation failed in a way the rules never allow
    UnexpectedError {
        community: CommunityId,
        action: String,
        error: String,
    },
    /// Community task panicked or was cancelled
    TaskFailed { error: String },
}

/// Statistics for simulation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulatorStats {
    pub polls_admitted: u64,
    pub polls_refused: u64,
    pub votes_recorded: u64,
    pub votes_refused: u64,
    pub closes: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub expired: u64,
}

impl SimulatorStats {
    fn absorb(&mut self, other: &Self) {
        self.polls_admitted += other.polls_admitted;
        self.polls_refused += other.polls_refused;
        self.votes_recorded += other.votes_recorded;
        self.votes_refused += other.votes_refused;
        self.closes += other.closes;
        self.accepted += other.accepted;
        self.rejected += other.rejected;
        self.expired += other.expired;
    }
}

/// Final report from simulator
#[derive(Debug, Clone)]
pub struct SimulatorReport {
    pub config: SimulatorConfig,
    pub stats: SimulatorStats,
    pub violations: Vec<Violation>,
}

impl SimulatorReport {
    /// Check if simulation passed all criteria
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Generate text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();
        let stats = &self.stats;

        report.push_str("=== EOD Simulator Report ===\n\n");
        let _ = writeln!(report, "Seed: {}", self.config.seed);
        let _ = writeln!(report, "Communities: {}", self.config.communities);
        let _ = writeln!(report, "Polls Admitted: {}", stats.polls_admitted);
        let _ = writeln!(report, "Polls Refused (limit): {}", stats.polls_refused);
        let _ = writeln!(report, "Votes Recorded: {}", stats.votes_recorded);
        let _ = writeln!(report, "Votes Refused: {}", stats.votes_refused);
        let _ = writeln!(report, "Admin Closes: {}", stats.closes);
        let _ = writeln!(
            report,
            "Accepted / Rejected / Expired: {} / {} / {}",
            stats.accepted, stats.rejected, stats.expired
        );
        let _ = writeln!(report, "Violations: {}", self.violations.len());

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                let _ = writeln!(report, "{}. {v:?}", i + 1);
            }
        }

        let _ = writeln!(
            report,
            "\n=== Result: {} ===",
            if self.passed() { "PASS" } else { "FAIL" }
        );
        report
    }
}

#[derive(Debug, Default)]
struct CommunityOutcome {
    stats: SimulatorStats,
    violations: Vec<Violation>,
}

/// Votes the instance acknowledged for one poll
#[derive(Debug, Default)]
struct Tally {
    favour: BTreeSet<UserId>,
    against: BTreeSet<UserId>,
}

/// Run the EOD simulator
pub async fn run_simulator(config: SimulatorConfig) -> SimulatorReport {
    let manager = Arc::new(InstanceManager::new(ManagerConfig {
        defaults: config.game_config(),
        ..ManagerConfig::default()
    }));

    let tasks: Vec<_> = (1..=config.communities)
        .map(|c| {
            let manager = Arc::clone(&manager);
            let config = config.clone();
            tokio::spawn(async move { simulate_community(&manager, CommunityId(c), &config).await })
        })
        .collect();

    let mut stats = SimulatorStats::default();
    let mut violations = Vec::new();
    for joined in join_all(tasks).await {
        match joined {
            Ok(outcome) => {
                stats.absorb(&outcome.stats);
                violations.extend(outcome.violations);
            }
            Err(err) => violations.push(Violation::TaskFailed {
                error: err.to_string(),
            }),
        }
    }

    tracing::info!(
        seed = config.seed,
        accepted = stats.accepted,
        violations = violations.len(),
        "simulation finished"
    );
    SimulatorReport {
        config,
        stats,
        violations,
    }
}

async fn simulate_community(
    manager: &InstanceManager,
    community: CommunityId,
    config: &SimulatorConfig,
) -> CommunityOutcome {
    let mut outcome = CommunityOutcome::default();
    let game = match manager.get_or_create_default(community) {
        Ok(game) => game,
        Err(err) => {
            outcome.violations.push(Violation::UnexpectedError {
                community,
                action: "create instance".into(),
                error: err.to_string(),
            });
            return outcome;
        }
    };
    let mut rng = StdRng::seed_from_u64(config.seed ^ community.get().rotate_left(32));
    let mut events = game.subscribe();
    let mut remaining = config.polls;
    let mut wave = 0u64;

    while remaining > 0 {
        wave += 1;
        let admitted = admit_wave(&game, &mut rng, &mut remaining, &mut outcome);
        if admitted.is_empty() {
            break;
        }

        let actions = plan_actions(&mut rng, &admitted, config);
        let mut tallies: BTreeMap<PollId, Tally> =
            admitted.iter().map(|id| (*id, Tally::default())).collect();
        // Each phase fits in the broadcast buffer on its own
        let mut applied = BTreeMap::new();
        drain_events(&mut events, community, &mut applied, &mut outcome);
        run_actions(&game, actions, &mut tallies, &mut outcome).await;
        drain_events(&mut events, community, &mut applied, &mut outcome);
        close_out(&game, &admitted, &mut outcome);
        drain_events(&mut events, community, &mut applied, &mut outcome);

        audit_wave(&game, &tallies, &applied, config, &mut outcome);

        tracing::debug!(
            community = %community,
            wave,
            polls = admitted.len(),
            violations = outcome.violations.len(),
            "wave audited"
        );
        if config.stop_on_first_violation && !outcome.violations.is_empty() {
            break;
        }
    }
    outcome
}

/// Admit mark polls until the queue is full or the budget is spent
fn admit_wave(
    game: &GameInstance,
    rng: &mut StdRng,
    remaining: &mut u64,
    outcome: &mut CommunityOutcome,
) -> Vec<PollId> {
    let community = game.community();
    let starters = game.db().starter_ids();
    let mut admitted = Vec::new();
    if starters.is_empty() {
        return admitted;
    }

    while *remaining > 0 && admitted.len() < MAX_WAVE_POLLS {
        let target = starters[rng.gen_range(0..starters.len())];
        let built = game
            .db()
            .lookup(target)
            .map_err(GameError::from)
            .and_then(|element| {
                PollKind::mark(&element, format!("sim {community} #{remaining}"))
                    .map_err(GameError::from)
            });
        let proposer = UserId(rng.gen_range(1..=1_000));
        let result = built.and_then(|kind| game.suggest_poll(Poll::new(proposer, kind)));
        match result {
            Ok(poll) => {
                *remaining -= 1;
                outcome.stats.polls_admitted += 1;
                admitted.push(poll.id());
            }
            Err(GameError::PollLimit(_)) => {
                outcome.stats.polls_refused += 1;
                break;
            }
            Err(err) => {
                outcome.violations.push(Violation::UnexpectedError {
                    community,
                    action: "suggest poll".into(),
                    error: err.to_string(),
                });
                break;
            }
        }
    }
    admitted
}

fn plan_actions(rng: &mut StdRng, polls: &[PollId], config: &SimulatorConfig) -> Vec<SimulatedAction> {
    (0..WAVE_ACTIONS)
        .map(|_| {
            let poll = polls[rng.gen_range(0..polls.len())];
            let user = UserId(rng.gen_range(1..=config.users.max(1)));
            match rng.gen_range(0..100) {
                0..=3 => SimulatedAction::Close(poll, AdminClose::Reject),
                4..=7 => SimulatedAction::Close(poll, AdminClose::Expire),
                8..=37 if config.reject_req.is_some() => SimulatedAction::Downvote(poll, user),
                _ => SimulatedAction::Vote(poll, user),
            }
        })
        .collect()
}

async fn run_actions(
    game: &Arc<GameInstance>,
    actions: Vec<SimulatedAction>,
    tallies: &mut BTreeMap<PollId, Tally>,
    outcome: &mut CommunityOutcome,
) {
    let community = game.community();
    let handles = actions.into_iter().map(|action| {
        let game = Arc::clone(game);
        tokio::task::spawn_blocking(move || (action, action.run(&game)))
    });

    for joined in join_all(handles).await {
        let (action, result) = match joined {
            Ok(pair) => pair,
            Err(err) => {
                outcome.violations.push(Violation::TaskFailed {
                    error: err.to_string(),
                });
                continue;
            }
        };
        match (action, result) {
            (SimulatedAction::Vote(poll, user) | SimulatedAction::Downvote(poll, user), Ok(_)) => {
                outcome.stats.votes_recorded += 1;
                let tally = tallies.entry(poll).or_default();
                let fresh = if matches!(action, SimulatedAction::Vote(..)) {
                    !tally.against.contains(&user) && tally.favour.insert(user)
                } else {
                    !tally.favour.contains(&user) && tally.against.insert(user)
                };
                if !fresh {
                    outcome.violations.push(Violation::DoubleCounted {
                        community,
                        poll,
                        user,
                    });
                }
            }
            (SimulatedAction::Close(..), Ok(_)) => outcome.stats.closes += 1,
            (_, Err(GameError::DuplicateVote { .. } | GameError::AlreadyResolved { .. })) => {
                outcome.stats.votes_refused += 1;
            }
            (action, Err(err)) => outcome.violations.push(Violation::UnexpectedError {
                community,
                action: format!("{action:?} on {}", action.poll()),
                error: err.to_string(),
            }),
        }
    }
}

/// Expire whatever the burst left pending
fn close_out(game: &GameInstance, polls: &[PollId], outcome: &mut CommunityOutcome) {
    for id in polls {
        if game.poll(*id).is_some_and(|p| p.is_pending()) {
            match game.close_poll(*id, AdminClose::Expire) {
                Ok(_) | Err(GameError::AlreadyResolved { .. }) => {}
                Err(err) => outcome.violations.push(Violation::UnexpectedError {
                    community: game.community(),
                    action: format!("close out {id}"),
                    error: err.to_string(),
                }),
            }
        }
    }
}

/// Count graph changes per poll from queued events
fn drain_events(
    events: &mut broadcast::Receiver<GameEvent>,
    community: CommunityId,
    applied: &mut BTreeMap<PollId, usize>,
    outcome: &mut CommunityOutcome,
) {
    loop {
        match events.try_recv() {
            Ok(GameEvent::PollResolved {
                poll,
                element: Some(_),
                ..
            }) => *applied.entry(poll.id()).or_default() += 1,
            Ok(_) => {}
            Err(TryRecvError::Lagged(missed)) => {
                outcome
                    .violations
                    .push(Violation::EventsLagged { community, missed });
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

fn audit_wave(
    game: &GameInstance,
    tallies: &BTreeMap<PollId, Tally>,
    applied: &BTreeMap<PollId, usize>,
    config: &SimulatorConfig,
    outcome: &mut CommunityOutcome,
) {
    let community = game.community();
    for (&id, tally) in tallies {
        let Some(poll) = game.poll(id) else {
            outcome.violations.push(Violation::UnexpectedError {
                community,
                action: format!("audit {id}"),
                error: "poll vanished".into(),
            });
            continue;
        };
        let times = applied.get(&id).copied().unwrap_or_default();
        match poll.status() {
            PollStatus::Pending => {
                outcome
                    .violations
                    .push(Violation::LeftPending { community, poll: id });
            }
            PollStatus::Accepted => {
                outcome.stats.accepted += 1;
                match times {
                    1 => {}
                    0 => outcome
                        .violations
                        .push(Violation::AcceptedNotApplied { community, poll: id }),
                    _ => outcome.violations.push(Violation::AppliedTwice {
                        community,
                        poll: id,
                        times,
                    }),
                }
            }
            status => {
                if status == PollStatus::Rejected {
                    outcome.stats.rejected += 1;
                } else {
                    outcome.stats.expired += 1;
                }
                if times > 0 {
                    outcome.violations.push(Violation::AppliedWithoutAcceptance {
                        community,
                        poll: id,
                        status,
                    });
                }
            }
        }

        for (acknowledged, stored) in [
            (tally.favour.len(), poll.votes_for()),
            (tally.against.len(), poll.votes_against()),
        ] {
            if acknowledged != stored {
                outcome.violations.push(Violation::VoteCountMismatch {
                    community,
                    poll: id,
                    acknowledged,
                    stored,
                });
            }
        }
        let over_for = poll.votes_for() > config.vote_req;
        let over_against = config.reject_req.is_some_and(|req| poll.votes_against() > req);
        if over_for || over_against {
            outcome.violations.push(Violation::ThresholdOvershoot {
                community,
                poll: id,
                votes: poll.votes_for() + poll.votes_against(),
            });
        }
    }
}
