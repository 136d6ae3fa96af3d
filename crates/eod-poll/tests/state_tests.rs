use eod_database::Database;
use eod_model::{ElementName, PollId, UserId};
use eod_poll::{
    allowed_transitions, validate_transition, Closure, Poll, PollError, PollKind, PollStatus,
};
use proptest::prelude::*;

fn seeded() -> Database {
    Database::new(
        ["Air", "Earth", "Fire", "Water"].map(|n| ElementName::new(n).unwrap()),
        None,
    )
    .unwrap()
}

fn mark_poll(db: &Database) -> Poll {
    let earth = db.lookup("Earth").unwrap();
    let mut poll = Poll::new(UserId(1), PollKind::mark(&earth, "solid ground").unwrap());
    poll.admit(PollId(7)).unwrap();
    poll
}

#[test]
fn test_pending_transitions() {
    assert!(validate_transition(PollStatus::Pending, PollStatus::Accepted).is_ok());
    assert!(validate_transition(PollStatus::Pending, PollStatus::Rejected).is_ok());
    assert!(validate_transition(PollStatus::Pending, PollStatus::Expired).is_ok());

    // Invalid
    assert!(validate_transition(PollStatus::Accepted, PollStatus::Rejected).is_err());
    assert!(validate_transition(PollStatus::Expired, PollStatus::Pending).is_err());
}

#[test]
fn test_timed_out_poll_expires_without_mutation() {
    let db = seeded();
    let mut poll = mark_poll(&db);
    poll.cast_vote(UserId(2), 3).unwrap();
    let resolution = poll.resolve(&db, Closure::TimedOut).unwrap();
    assert_eq!(resolution.status, PollStatus::Expired);
    assert!(db.lookup("Earth").unwrap().mark.is_none());
}

#[test]
fn test_vote_after_resolution_rejected() {
    let db = seeded();
    let mut poll = mark_poll(&db);
    poll.resolve(&db, Closure::AdminExpired).unwrap();
    assert_eq!(
        poll.cast_vote(UserId(3), 1).unwrap_err(),
        PollError::AlreadyResolved {
            poll: PollId(7),
            status: PollStatus::Expired
        }
    );
}

#[test]
fn test_unadmitted_poll_is_inert() {
    let db = seeded();
    let earth = db.lookup("Earth").unwrap();
    let mut poll = Poll::new(UserId(1), PollKind::mark(&earth, "solid ground").unwrap());

    assert_eq!(poll.cast_vote(UserId(2), 1).unwrap_err(), PollError::NotAdmitted);
    assert_eq!(
        poll.resolve(&db, Closure::Accept).unwrap_err(),
        PollError::NotAdmitted
    );
    assert!(db.lookup("Earth").unwrap().mark.is_none());

    poll.admit(PollId(3)).unwrap();
    assert!(poll.cast_vote(UserId(2), 1).unwrap());
}

#[test]
fn test_resolved_poll_cannot_be_readmitted() {
    let db = seeded();
    let mut poll = mark_poll(&db);
    poll.resolve(&db, Closure::AdminRejected).unwrap();
    assert_eq!(
        poll.check_fresh().unwrap_err(),
        PollError::AlreadyAdmitted(PollId(7))
    );
}

fn any_status() -> impl Strategy<Value = PollStatus> {
    prop_oneof![
        Just(PollStatus::Pending),
        Just(PollStatus::Accepted),
        Just(PollStatus::Rejected),
        Just(PollStatus::Expired),
    ]
}

proptest! {
    #[test]
    fn prop_all_transitions_are_subset_of_allowed(from in any_status(), to in any_status()) {
        let res = validate_transition(from, to);
        let allowed = allowed_transitions(from);

        if res.is_ok() {
            prop_assert!(allowed.contains(&to));
        } else {
            prop_assert!(!allowed.contains(&to));
        }
    }

    #[test]
    fn prop_accepts_exactly_once_at_threshold(
        voters in proptest::collection::vec(1u64..40, 1..40),
        vote_req in 1usize..10,
    ) {
        let db = seeded();
        let mut poll = mark_poll(&db);
        let mut distinct = std::collections::HashSet::new();
        let mut accepted = 0;

        for voter in voters {
            let fresh = distinct.insert(voter);
            match poll.cast_vote(UserId(voter), vote_req) {
                Ok(true) => {
                    prop_assert!(fresh);
                    prop_assert_eq!(distinct.len(), vote_req);
                    poll.resolve(&db, Closure::Accept).unwrap();
                    accepted += 1;
                }
                Ok(false) => prop_assert!(distinct.len() < vote_req),
                Err(PollError::DuplicateVote { .. }) => prop_assert!(!fresh),
                Err(PollError::AlreadyResolved { .. }) => {
                    prop_assert_eq!(poll.status(), PollStatus::Accepted);
                }
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
        }

        prop_assert!(accepted <= 1);
        prop_assert_eq!(accepted == 1, distinct.len() >= vote_req);
    }
}
