use eod_database::{Database, DatabaseError, Mutation};
use eod_model::{CollaboratorSet, Combination, ElementAttributes, ElementId, ElementName, UserId};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

fn starters() -> Database {
    Database::new(
        ["Air", "Earth", "Fire", "Water"].map(|n| ElementName::new(n).unwrap()),
        Some(UserId(1000)),
    )
    .unwrap()
}

#[test]
fn test_fire_lookup_is_case_insensitive() {
    let db = Database::new(
        ["Air", "Water"].map(|n| ElementName::new(n).unwrap()),
        None,
    )
    .unwrap();
    assert!(!db.has_element("Fire"));

    let fire = db
        .create_element(ElementName::new("Fire").unwrap(), Some(UserId(1)), ElementAttributes::new())
        .unwrap();
    assert!(db.has_element("FIRE"));
    assert_eq!(db.lookup("fIrE").unwrap().id, fire.id);

    let err = db
        .create_element(ElementName::new("fire").unwrap(), Some(UserId(2)), ElementAttributes::new())
        .unwrap_err();
    assert!(matches!(err, DatabaseError::DuplicateName(_)));
    assert!(err.is_conflict());
}

#[test]
fn test_second_identical_collaborator_addition_rejected() {
    let db = starters();
    let combo = Combination::new([ElementId(3), ElementId(4)]).unwrap();
    let steam = db
        .apply_mutation(&Mutation::CreateElement {
            combination: combo,
            name: ElementName::new("Steam").unwrap(),
            author: UserId(1),
        })
        .unwrap()
        .element()
        .clone();

    let add = Mutation::AddCollaborators {
        target: steam.id,
        users: CollaboratorSet::new([UserId(2), UserId(3)]).unwrap(),
    };
    db.apply_mutation(&add).unwrap();
    let err = db.apply_mutation(&add).unwrap_err();
    assert!(matches!(err, DatabaseError::AlreadyCollaborator { .. }));
    assert_eq!(db.lookup(steam.id).unwrap().extra_authors.len(), 2);
}

#[test]
fn test_concurrent_creates_keep_names_unique() {
    let db = Arc::new(starters());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                let mut created = 0;
                for i in 0..50 {
                    // Threads overlap on half the names
                    let name = format!("Element{}", (i + t * 25) % 200);
                    if db
                        .create_element(
                            ElementName::new(name).unwrap(),
                            Some(UserId(t)),
                            ElementAttributes::new(),
                        )
                        .is_ok()
                    {
                        created += 1;
                    }
                }
                created
            })
        })
        .collect();

    let created: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(db.element_count(), 4 + created);

    let names: HashSet<String> = db.elements().iter().map(|e| e.name.key()).collect();
    assert_eq!(names.len(), db.element_count());
}

proptest! {
    #[test]
    fn prop_name_index_matches_elements(
        names in proptest::collection::vec(
            prop_oneof![
                Just("Steam"), Just("STEAM"), Just("Mud"), Just("mud"),
                Just("Lava"), Just("Cloud"), Just("air"), Just("Fire"),
            ],
            0..30,
        ),
    ) {
        let db = starters();
        let mut last_id = ElementId(4);
        for name in &names {
            if let Ok(element) = db.create_element(
                ElementName::new(*name).unwrap(),
                Some(UserId(1)),
                ElementAttributes::new(),
            ) {
                prop_assert!(element.id > last_id);
                last_id = element.id;
            }
            prop_assert!(db.has_element(&name.to_uppercase()));
        }

        let distinct: HashSet<String> = ["air", "earth", "fire", "water"]
            .iter()
            .map(|s| (*s).to_string())
            .chain(names.iter().map(|n| n.to_lowercase()))
            .collect();
        prop_assert_eq!(db.element_count(), distinct.len());
    }
}
