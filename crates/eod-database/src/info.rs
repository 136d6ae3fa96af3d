//! Element info queries
//!
//! Read-only views assembled under a single read lock.

use crate::error::DatabaseError;
use crate::store::{Database, GraphState};
use eod_model::{Combination, Element, ElementId, ElementRef, UserId};
use std::collections::HashSet;

/// Everything shown on an element's info card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementInfo {
    /// The element itself
    pub element: Element,
    /// Combinations that produce it
    pub made_with: Vec<Combination>,
    /// Number of distinct elements it is an input of
    pub used_in: usize,
    /// Number of users who own it
    pub found_by: usize,
    /// Number of distinct elements in its origin tree, itself included
    pub tree_size: usize,
    /// Whether the viewing user owns it
    pub in_inventory: bool,
}

impl Database {
    /// Info card for an element, as seen by `viewer`
    ///
    /// # Errors
    /// `DatabaseError::ElementNotFound` if absent
    pub fn element_info(
        &self,
        reference: impl Into<ElementRef>,
        viewer: Option<UserId>,
    ) -> Result<ElementInfo, DatabaseError> {
        let reference = reference.into();
        let state = self.read();
        let element = state.get(&reference)?.clone();
        let id = element.id;

        let found_by = state.users.values().filter(|u| u.has(id)).count();
        let in_inventory = viewer
            .and_then(|v| state.users.get(&v))
            .is_some_and(|u| u.has(id));

        Ok(ElementInfo {
            made_with: state.made_with.get(&id).cloned().unwrap_or_default(),
            used_in: state.used_in.get(&id).map_or(0, |s| s.len()),
            found_by,
            tree_size: tree_size(&state, id),
            in_inventory,
            element,
        })
    }

    /// Elements whose origin tree contains `id`, including itself
    #[must_use]
    pub fn tree_size(&self, id: ElementId) -> usize {
        tree_size(&self.read(), id)
    }
}

/// Count distinct elements reachable through origin recipes
///
/// Iterative so deep graphs cannot overflow the stack.
fn tree_size(state: &GraphState, root: ElementId) -> usize {
    if !state.elements.contains_key(&root) {
        return 0;
    }
    let mut seen = HashSet::from([root]);
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let Some(origin) = state.elements.get(&id).and_then(|e| e.origin.as_ref()) else {
            continue;
        };
        for input in origin.distinct() {
            if seen.insert(input) {
                stack.push(input);
            }
        }
    }
    seen.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::Mutation;
    use eod_model::ElementName;

    fn name(s: &str) -> ElementName {
        ElementName::new(s).unwrap()
    }

    fn build() -> Database {
        // 1 Air, 2 Earth, 3 Fire, 4 Water
        let db = Database::new(["Air", "Earth", "Fire", "Water"].map(name), None).unwrap();
        let make = |a: u64, b: u64, n: &str| {
            db.apply_mutation(&Mutation::CreateElement {
                combination: Combination::new([ElementId(a), ElementId(b)]).unwrap(),
                name: name(n),
                author: UserId(1),
            })
            .unwrap();
        };
        make(3, 4, "Steam"); // 5
        make(2, 4, "Mud"); // 6
        make(5, 6, "Geyser"); // 7
        db
    }

    #[test]
    fn starter_tree_is_itself() {
        let db = build();
        assert_eq!(db.tree_size(ElementId(1)), 1);
    }

    #[test]
    fn shared_ancestors_counted_once() {
        let db = build();
        // Geyser, Steam, Mud, Fire, Water, Earth
        assert_eq!(db.tree_size(ElementId(7)), 6);
        assert_eq!(db.tree_size(ElementId(99)), 0);
    }

    #[test]
    fn info_card() {
        let db = build();
        db.login(UserId(2));
        db.grant(UserId(2), ElementId(4)).unwrap();

        let water = db.element_info("water", Some(UserId(2))).unwrap();
        assert_eq!(water.element.name.as_str(), "Water");
        assert_eq!(water.used_in, 2);
        assert_eq!(water.found_by, 1);
        assert!(water.in_inventory);
        assert!(water.made_with.is_empty());

        let steam = db.element_info("Steam", Some(UserId(2))).unwrap();
        assert_eq!(steam.made_with.len(), 1);
        // Author owns it
        assert_eq!(steam.found_by, 1);
        assert!(!steam.in_inventory);
        assert_eq!(steam.tree_size, 3);
    }

    #[test]
    fn info_missing_element() {
        let db = build();
        assert!(db.element_info("Lava", None).unwrap_err().is_not_found());
    }
}
