//! Snapshot and restore
//!
//! A [`DatabaseSnapshot`] is a plain serde value. Restoring re-checks every
//! graph invariant and rebuilds the indices, so a hand-edited or truncated
//! snapshot is refused instead of loaded half-valid.

use crate::error::DatabaseError;
use crate::store::{Database, GraphState};
use eod_model::{Combination, Element, ElementId, User, UserId, MAX_COLLABORATORS};
use serde::{Deserialize, Serialize};

/// One recipe edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeEdge {
    /// Inputs
    pub combination: Combination,
    /// Output element
    pub output: ElementId,
}

/// Serializable copy of a whole database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    /// Elements ordered by id
    pub elements: Vec<Element>,
    /// Recipe edges ordered by output then inputs
    pub recipes: Vec<RecipeEdge>,
    /// Users ordered by id
    pub users: Vec<User>,
    /// Starter element ids
    pub starters: Vec<ElementId>,
    /// Next element id to hand out
    pub next_id: u64,
}

impl Database {
    /// Capture the current state
    #[must_use]
    pub fn snapshot(&self) -> DatabaseSnapshot {
        let state = self.read();

        let mut elements: Vec<Element> = state.elements.values().cloned().collect();
        elements.sort_by_key(|e| e.id);

        let mut recipes: Vec<RecipeEdge> = state
            .recipes
            .iter()
            .map(|(combination, output)| RecipeEdge {
                combination: combination.clone(),
                output: *output,
            })
            .collect();
        recipes.sort_by(|a, b| {
            a.output
                .cmp(&b.output)
                .then_with(|| a.combination.cmp(&b.combination))
        });

        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by_key(|u| u.id);

        DatabaseSnapshot {
            elements,
            recipes,
            users,
            starters: state.starters.clone(),
            next_id: state.next_id,
        }
    }

    /// Rebuild a database from a snapshot
    ///
    /// # Errors
    /// `DatabaseError::CorruptSnapshot` naming the first violated invariant
    pub fn from_snapshot(
        snapshot: DatabaseSnapshot,
        system_user: Option<UserId>,
    ) -> Result<Self, DatabaseError> {
        let corrupt = DatabaseError::CorruptSnapshot;
        let mut state = GraphState {
            next_id: snapshot.next_id,
            ..GraphState::default()
        };

        for element in snapshot.elements {
            if element.id.get() >= snapshot.next_id {
                return Err(corrupt(format!(
                    "element {} is not below next id {}",
                    element.id, snapshot.next_id
                )));
            }
            if element.extra_authors.len() > MAX_COLLABORATORS {
                return Err(corrupt(format!("element {} has too many collaborators", element.id)));
            }
            if let Some(author) = element.author {
                if element.extra_authors.contains(&author) {
                    return Err(corrupt(format!(
                        "author of {} is also listed as a collaborator",
                        element.id
                    )));
                }
            }
            if state.by_name.insert(element.name.key(), element.id).is_some() {
                return Err(corrupt(format!("duplicate name {:?}", element.name.as_str())));
            }
            if state.elements.insert(element.id, element).is_some() {
                return Err(corrupt("duplicate element id".to_string()));
            }
        }

        for id in &snapshot.starters {
            match state.elements.get(id) {
                Some(e) if e.is_origin() => {}
                Some(_) => return Err(corrupt(format!("starter {id} has a creation time"))),
                None => return Err(corrupt(format!("starter {id} does not exist"))),
            }
        }
        state.starters = snapshot.starters;

        for edge in snapshot.recipes {
            let known = |id: &ElementId| state.elements.contains_key(id);
            if !known(&edge.output) || !edge.combination.inputs().iter().all(known) {
                return Err(corrupt(format!(
                    "recipe {} -> {} references a missing element",
                    edge.combination, edge.output
                )));
            }
            if state.recipes.contains_key(&edge.combination) {
                return Err(corrupt(format!("recipe {} listed twice", edge.combination)));
            }
            for input in edge.combination.distinct() {
                state.used_in.entry(input).or_default().insert(edge.output);
            }
            state
                .made_with
                .entry(edge.output)
                .or_default()
                .push(edge.combination.clone());
            state.recipes.insert(edge.combination, edge.output);
        }

        for element in state.elements.values() {
            if let Some(origin) = &element.origin {
                if state.recipes.get(origin) != Some(&element.id) {
                    return Err(corrupt(format!(
                        "origin of {} is not a recipe for it",
                        element.id
                    )));
                }
            }
        }

        for user in snapshot.users {
            if let Some(missing) = user
                .inventory
                .iter()
                .find(|id| !state.elements.contains_key(*id))
            {
                return Err(corrupt(format!(
                    "user {} owns missing element {missing}",
                    user.id
                )));
            }
            state.users.insert(user.id, user);
        }

        tracing::info!(
            elements = state.elements.len(),
            recipes = state.recipes.len(),
            users = state.users.len(),
            "database restored"
        );
        Ok(Self::from_state(state, system_user))
    }
}
