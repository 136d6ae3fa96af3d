//! Recipe inputs
//!
//! A [`Combination`] is an unordered multiset of element ids. It is stored
//! sorted so that `Water + Fire` and `Fire + Water` key the same recipe.

use crate::ids::ElementId;
use crate::payload::PayloadError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unordered multiset of at least two input elements
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<ElementId>", into = "Vec<ElementId>")]
pub struct Combination(Vec<ElementId>);

impl Combination {
    /// Minimum number of inputs
    pub const MIN_INPUTS: usize = 2;

    /// Build a combination from inputs in any order
    ///
    /// # Errors
    /// `PayloadError::CombinationTooSmall` for fewer than two inputs
    pub fn new(inputs: impl IntoIterator<Item = ElementId>) -> Result<Self, PayloadError> {
        let mut ids: Vec<ElementId> = inputs.into_iter().collect();
        if ids.len() < Self::MIN_INPUTS {
            return Err(PayloadError::CombinationTooSmall(ids.len()));
        }
        ids.sort_unstable();
        Ok(Self(ids))
    }

    /// Inputs in canonical (sorted) order
    #[inline]
    #[must_use]
    pub fn inputs(&self) -> &[ElementId] {
        &self.0
    }

    /// Number of inputs, counting repeats
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a constructed combination
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Distinct inputs
    pub fn distinct(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(i, id)| *i == 0 || self.0[i - 1] != **id)
            .map(|(_, id)| *id)
    }

    /// Whether `id` is one of the inputs
    #[inline]
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.0.binary_search(&id).is_ok()
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(" + "))
    }
}

impl TryFrom<Vec<ElementId>> for Combination {
    type Error = PayloadError;

    fn try_from(value: Vec<ElementId>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Combination> for Vec<ElementId> {
    fn from(value: Combination) -> Self {
        value.0
    }
}
