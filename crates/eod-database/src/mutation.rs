//! Mutations
//!
//! A [`Mutation`] is one approved change to the graph. The database applies
//! each mutation under a single write lock after validating all of it, so a
//! reader sees either the whole change or none of it.

use eod_model::{
    CollaboratorSet, Combination, Element, ElementId, ElementName, HexColor, ImageUrl, Mark, UserId,
};
use serde::{Deserialize, Serialize};

/// One change to the element graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    /// Replace an element's mark
    SetMark {
        target: ElementId,
        mark: Mark,
        by: UserId,
    },
    /// Replace an element's color
    SetColor {
        target: ElementId,
        color: HexColor,
        by: UserId,
    },
    /// Replace an element's image
    SetImage {
        target: ElementId,
        image: ImageUrl,
        by: UserId,
    },
    /// Replace an element's icon
    SetIcon {
        target: ElementId,
        icon: ImageUrl,
        by: UserId,
    },
    /// Credit additional collaborators
    AddCollaborators {
        target: ElementId,
        users: CollaboratorSet,
    },
    /// Remove collaborators
    RemoveCollaborators {
        target: ElementId,
        users: CollaboratorSet,
    },
    /// Link a combination to an existing element
    AddRecipe {
        combination: Combination,
        output: ElementId,
    },
    /// Create a new element made from a combination
    CreateElement {
        combination: Combination,
        name: ElementName,
        author: UserId,
    },
}

impl Mutation {
    /// Existing element this mutation edits, if any
    #[must_use]
    pub fn target(&self) -> Option<ElementId> {
        match self {
            Self::SetMark { target, .. }
            | Self::SetColor { target, .. }
            | Self::SetImage { target, .. }
            | Self::SetIcon { target, .. }
            | Self::AddCollaborators { target, .. }
            | Self::RemoveCollaborators { target, .. } => Some(*target),
            Self::AddRecipe { output, .. } => Some(*output),
            Self::CreateElement { .. } => None,
        }
    }

    /// Short label for logs
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::SetMark { .. } => "set_mark",
            Self::SetColor { .. } => "set_color",
            Self::SetImage { .. } => "set_image",
            Self::SetIcon { .. } => "set_icon",
            Self::AddCollaborators { .. } => "add_collaborators",
            Self::RemoveCollaborators { .. } => "remove_collaborators",
            Self::AddRecipe { .. } => "add_recipe",
            Self::CreateElement { .. } => "create_element",
        }
    }
}

/// Result of a successfully applied mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// An existing element changed; holds its new state
    Updated(Element),
    /// A recipe now leads to an existing element
    Linked {
        combination: Combination,
        output: Element,
    },
    /// A new element was created
    Created(Element),
}

impl Applied {
    /// The element affected by the mutation
    #[inline]
    #[must_use]
    pub fn element(&self) -> &Element {
        match self {
            Self::Updated(e) | Self::Created(e) => e,
            Self::Linked { output, .. } => output,
        }
    }
}
