//! Poll kinds
//!
//! [`PollKind`] is a closed sum over every proposal the engine accepts. Each
//! constructor validates its payload against the target element, so a kind
//! value can always be turned into a [`Mutation`] without further checks.

use crate::error::PollError;
use eod_database::Mutation;
use eod_model::{
    CollaboratorSet, Combination, Element, ElementId, ElementName, HexColor, ImageUrl, Mark,
    PayloadError, UserId, MAX_COLLABORATORS,
};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// A proposed change and its typed payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PollKind {
    /// Replace an element's mark
    Mark { target: ElementId, mark: Mark },
    /// Replace an element's color
    Color { target: ElementId, color: HexColor },
    /// Replace an element's image
    Image { target: ElementId, image: ImageUrl },
    /// Replace an element's icon
    Icon { target: ElementId, icon: ImageUrl },
    /// Credit new collaborators
    AddCollaborators {
        target: ElementId,
        users: CollaboratorSet,
    },
    /// Remove existing collaborators
    RemoveCollaborators {
        target: ElementId,
        users: CollaboratorSet,
    },
    /// Create a new element from a combination
    NewElement {
        combination: Combination,
        name: ElementName,
    },
    /// Make a combination produce an existing element
    NewRecipe {
        combination: Combination,
        output: ElementId,
    },
}

impl PollKind {
    /// Mark change
    ///
    /// # Errors
    /// `PayloadError::MarkTooLong` over 3000 characters
    pub fn mark(element: &Element, text: impl Into<String>) -> Result<Self, PollError> {
        Ok(Self::Mark {
            target: element.id,
            mark: Mark::new(text)?,
        })
    }

    /// Color change from a `#rrggbb` code
    ///
    /// # Errors
    /// `PayloadError::InvalidColor` for anything else
    pub fn color(element: &Element, code: &str) -> Result<Self, PollError> {
        Ok(Self::Color {
            target: element.id,
            color: HexColor::parse(code)?,
        })
    }

    /// Image change; the link must already be content-type checked
    #[must_use]
    pub fn image(element: &Element, image: ImageUrl) -> Self {
        Self::Image {
            target: element.id,
            image,
        }
    }

    /// Icon change; the link must already be content-type checked
    #[must_use]
    pub fn icon(element: &Element, icon: ImageUrl) -> Self {
        Self::Icon {
            target: element.id,
            icon,
        }
    }

    /// Add collaborators
    ///
    /// Candidates that already collaborate, the author, the system account
    /// and repeats are dropped silently. What remains must be non-empty and
    /// keep the element within the collaborator cap.
    ///
    /// # Errors
    /// - `PollError::NotUserCreated` for starter elements
    /// - `PayloadError::NoCollaborators` if nobody eligible is left
    /// - `PayloadError::TooManyCollaborators` over the cap
    pub fn add_collaborators(
        element: &Element,
        candidates: impl IntoIterator<Item = UserId>,
        system_user: Option<UserId>,
    ) -> Result<Self, PollError> {
        let author = element.author.ok_or(PollError::NotUserCreated(element.id))?;
        let eligible: IndexSet<UserId> = candidates
            .into_iter()
            .filter(|u| {
                *u != author && Some(*u) != system_user && !element.extra_authors.contains(u)
            })
            .collect();
        if eligible.is_empty() {
            return Err(PayloadError::NoCollaborators.into());
        }
        let count = eligible.len() + element.extra_authors.len();
        if count > MAX_COLLABORATORS {
            return Err(PayloadError::TooManyCollaborators {
                count,
                max: MAX_COLLABORATORS,
            }
            .into());
        }
        Ok(Self::AddCollaborators {
            target: element.id,
            users: CollaboratorSet::new(eligible)?,
        })
    }

    /// Remove collaborators
    ///
    /// Only current collaborators are kept from `candidates`.
    ///
    /// # Errors
    /// - `PollError::NotUserCreated` for starter elements
    /// - `PayloadError::NoCollaborators` if none of them collaborate
    pub fn remove_collaborators(
        element: &Element,
        candidates: impl IntoIterator<Item = UserId>,
    ) -> Result<Self, PollError> {
        if element.author.is_none() {
            return Err(PollError::NotUserCreated(element.id));
        }
        let current: IndexSet<UserId> = candidates
            .into_iter()
            .filter(|u| element.extra_authors.contains(u))
            .collect();
        Ok(Self::RemoveCollaborators {
            target: element.id,
            users: CollaboratorSet::new(current)?,
        })
    }

    /// New element from `inputs`
    ///
    /// # Errors
    /// Invalid name or fewer than two inputs
    pub fn new_element(inputs: &[Element], name: &str) -> Result<Self, PollError> {
        Ok(Self::NewElement {
            combination: Combination::new(inputs.iter().map(|e| e.id))?,
            name: ElementName::new(name)?,
        })
    }

    /// Link `inputs` to an existing `output`
    ///
    /// # Errors
    /// Fewer than two inputs
    pub fn new_recipe(inputs: &[Element], output: &Element) -> Result<Self, PollError> {
        Ok(Self::NewRecipe {
            combination: Combination::new(inputs.iter().map(|e| e.id))?,
            output: output.id,
        })
    }

    /// Existing element the poll is about, if any
    #[must_use]
    pub fn target(&self) -> Option<ElementId> {
        match self {
            Self::Mark { target, .. }
            | Self::Color { target, .. }
            | Self::Image { target, .. }
            | Self::Icon { target, .. }
            | Self::AddCollaborators { target, .. }
            | Self::RemoveCollaborators { target, .. } => Some(*target),
            Self::NewRecipe { output, .. } => Some(*output),
            Self::NewElement { .. } => None,
        }
    }

    /// Short label for logs and events
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mark { .. } => "mark",
            Self::Color { .. } => "color",
            Self::Image { .. } => "image",
            Self::Icon { .. } => "icon",
            Self::AddCollaborators { .. } => "add_collaborators",
            Self::RemoveCollaborators { .. } => "remove_collaborators",
            Self::NewElement { .. } => "new_element",
            Self::NewRecipe { .. } => "new_recipe",
        }
    }

    /// Database change this poll makes when accepted
    #[must_use]
    pub fn to_mutation(&self, proposer: UserId) -> Mutation {
        match self.clone() {
            Self::Mark { target, mark } => Mutation::SetMark {
                target,
                mark,
                by: proposer,
            },
            Self::Color { target, color } => Mutation::SetColor {
                target,
                color,
                by: proposer,
            },
            Self::Image { target, image } => Mutation::SetImage {
                target,
                image,
                by: proposer,
            },
            Self::Icon { target, icon } => Mutation::SetIcon {
                target,
                icon,
                by: proposer,
            },
            Self::AddCollaborators { target, users } => {
                Mutation::AddCollaborators { target, users }
            }
            Self::RemoveCollaborators { target, users } => {
                Mutation::RemoveCollaborators { target, users }
            }
            Self::NewElement { combination, name } => Mutation::CreateElement {
                combination,
                name,
                author: proposer,
            },
            Self::NewRecipe {
                combination,
                output,
            } => Mutation::AddRecipe {
                combination,
                output,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eod_model::AttributeCredits;
    use pretty_assertions::assert_eq;

    fn element(id: u64, author: Option<u64>, extra: &[u64]) -> Element {
        Element {
            id: ElementId(id),
            name: ElementName::new(format!("E{id}")).unwrap(),
            author: author.map(UserId),
            extra_authors: extra.iter().copied().map(UserId).collect(),
            mark: None,
            color: None,
            image: None,
            icon: None,
            created: if author.is_some() { 1_700_000_000 } else { 0 },
            origin: None,
            credits: AttributeCredits::default(),
        }
    }

    #[test]
    fn mark_length_checked_at_construction() {
        let water = element(4, None, &[]);
        assert!(PollKind::mark(&water, "x".repeat(3000)).is_ok());
        assert_eq!(
            PollKind::mark(&water, "x".repeat(3001)).unwrap_err(),
            PollError::InvalidPayload(PayloadError::MarkTooLong {
                len: 3001,
                max: 3000
            })
        );
    }

    #[test]
    fn color_shape_checked() {
        let water = element(4, None, &[]);
        assert!(PollKind::color(&water, "#00ffaa").is_ok());
        assert!(PollKind::color(&water, "00ffaa").is_err());
        assert!(PollKind::color(&water, "#00ffag").is_err());
    }

    #[test]
    fn add_collaborators_filters_ineligible() {
        let steam = element(5, Some(1), &[2]);
        let kind = PollKind::add_collaborators(
            &steam,
            [1, 2, 3, 3, 99, 4].map(UserId),
            Some(UserId(99)),
        )
        .unwrap();
        let PollKind::AddCollaborators { users, .. } = kind else {
            panic!("wrong kind");
        };
        assert_eq!(users.iter().collect::<Vec<_>>(), vec![UserId(3), UserId(4)]);
    }

    #[test]
    fn add_collaborators_nobody_left() {
        let steam = element(5, Some(1), &[2]);
        assert_eq!(
            PollKind::add_collaborators(&steam, [UserId(1), UserId(2)], None).unwrap_err(),
            PollError::InvalidPayload(PayloadError::NoCollaborators)
        );
    }

    #[test]
    fn add_collaborators_cap_counts_existing() {
        let steam = element(5, Some(1), &[10, 11, 12, 13, 14, 15, 16, 17, 18]);
        assert!(PollKind::add_collaborators(&steam, [UserId(2)], None).is_ok());
        assert_eq!(
            PollKind::add_collaborators(&steam, [UserId(2), UserId(3)], None).unwrap_err(),
            PollError::InvalidPayload(PayloadError::TooManyCollaborators { count: 11, max: 10 })
        );
    }

    #[test]
    fn collaborator_polls_need_an_author() {
        let air = element(1, None, &[]);
        assert_eq!(
            PollKind::add_collaborators(&air, [UserId(2)], None).unwrap_err(),
            PollError::NotUserCreated(ElementId(1))
        );
        assert_eq!(
            PollKind::remove_collaborators(&air, [UserId(2)]).unwrap_err(),
            PollError::NotUserCreated(ElementId(1))
        );
    }

    #[test]
    fn remove_keeps_only_current_collaborators() {
        let steam = element(5, Some(1), &[2, 3]);
        let kind = PollKind::remove_collaborators(&steam, [3, 7].map(UserId)).unwrap();
        assert_eq!(
            kind.to_mutation(UserId(1)),
            Mutation::RemoveCollaborators {
                target: ElementId(5),
                users: CollaboratorSet::new([UserId(3)]).unwrap(),
            }
        );
        assert!(PollKind::remove_collaborators(&steam, [UserId(7)]).is_err());
    }

    #[test]
    fn new_element_mutation_credits_proposer() {
        let inputs = [element(3, None, &[]), element(4, None, &[])];
        let kind = PollKind::new_element(&inputs, "Steam").unwrap();
        assert_eq!(kind.target(), None);
        assert_eq!(kind.label(), "new_element");
        assert!(matches!(
            kind.to_mutation(UserId(8)),
            Mutation::CreateElement { author: UserId(8), .. }
        ));
        assert!(PollKind::new_element(&inputs[..1], "Steam").is_err());
    }
}
