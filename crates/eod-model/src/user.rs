//! Players

use crate::ids::{ElementId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A player within one community
///
/// Created on first login and never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Platform identity
    pub id: UserId,
    /// Elements this user owns
    pub inventory: BTreeSet<ElementId>,
}

impl User {
    /// Create a user with an empty inventory
    #[inline]
    #[must_use]
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            inventory: BTreeSet::new(),
        }
    }

    /// Whether the user owns `element`
    #[inline]
    #[must_use]
    pub fn has(&self, element: ElementId) -> bool {
        self.inventory.contains(&element)
    }

    /// Add an element; returns false if it was already owned
    #[inline]
    pub fn grant(&mut self, element: ElementId) -> bool {
        self.inventory.insert(element)
    }
}
