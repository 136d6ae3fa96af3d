//! Graph nodes
//!
//! An [`Element`] returned from the database is a snapshot: mutating a copy
//! never affects stored state.

use crate::combination::Combination;
use crate::ids::{ElementId, UserId};
use crate::payload::{HexColor, ImageUrl, Mark, ElementName};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `created` value of starter elements, which predate the community
pub const ORIGIN_TIMESTAMP: i64 = 0;

/// Who last set each cosmetic attribute
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeCredits {
    /// Last user to set the mark
    pub marker: Option<UserId>,
    /// Last user to set the color
    pub colorer: Option<UserId>,
    /// Last user to set the image
    pub imager: Option<UserId>,
    /// Last user to set the icon
    pub iconer: Option<UserId>,
}

/// Optional attributes supplied when an element is created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementAttributes {
    /// Initial mark
    pub mark: Option<Mark>,
    /// Initial color
    pub color: Option<HexColor>,
    /// Initial image
    pub image: Option<ImageUrl>,
    /// Initial icon
    pub icon: Option<ImageUrl>,
    /// Recipe the element was first made with
    pub origin: Option<Combination>,
}

impl ElementAttributes {
    /// No attributes
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With origin recipe
    #[inline]
    #[must_use]
    pub fn with_origin(mut self, origin: Combination) -> Self {
        self.origin = Some(origin);
        self
    }

    /// With color
    #[inline]
    #[must_use]
    pub fn with_color(mut self, color: HexColor) -> Self {
        self.color = Some(color);
        self
    }

    /// With mark
    #[inline]
    #[must_use]
    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.mark = Some(mark);
        self
    }
}

/// A named node in the crafting graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Stable numeric id
    pub id: ElementId,
    /// Unique (case-insensitive) name
    pub name: ElementName,
    /// Primary author; `None` for starter elements
    pub author: Option<UserId>,
    /// Secondary credited authors, in the order they were added
    pub extra_authors: IndexSet<UserId>,
    /// Free-text annotation
    pub mark: Option<Mark>,
    /// Display color
    pub color: Option<HexColor>,
    /// Full-size image
    pub image: Option<ImageUrl>,
    /// Small icon
    pub icon: Option<ImageUrl>,
    /// Unix timestamp of creation, [`ORIGIN_TIMESTAMP`] for starters
    pub created: i64,
    /// Recipe this element was first made with
    pub origin: Option<Combination>,
    /// Attribute provenance
    #[serde(default)]
    pub credits: AttributeCredits,
}

impl Element {
    /// Whether this is a starter element
    #[inline]
    #[must_use]
    pub fn is_origin(&self) -> bool {
        self.created == ORIGIN_TIMESTAMP
    }

    /// Whether `user` is the author or a collaborator
    #[inline]
    #[must_use]
    pub fn is_credited(&self, user: UserId) -> bool {
        self.author == Some(user) || self.extra_authors.contains(&user)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Reference to an element by name or id, as typed by a user
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementRef {
    /// Case-insensitive name
    Name(String),
    /// Numeric id
    Id(ElementId),
}

impl ElementRef {
    /// Interpret `#<digits>` as an id, anything else as a name
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some(digits) = raw.strip_prefix('#') {
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                if let Ok(id) = digits.parse() {
                    return Self::Id(ElementId(id));
                }
            }
        }
        Self::Name(raw.to_string())
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

impl From<&str> for ElementRef {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for ElementRef {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&String> for ElementRef {
    fn from(value: &String) -> Self {
        Self::parse(value)
    }
}

impl From<ElementId> for ElementRef {
    fn from(value: ElementId) -> Self {
        Self::Id(value)
    }
}

impl From<&ElementName> for ElementRef {
    fn from(value: &ElementName) -> Self {
        Self::Name(value.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_ref_parsing() {
        assert_eq!(ElementRef::parse("#42"), ElementRef::Id(ElementId(42)));
        assert_eq!(ElementRef::parse(" Fire "), ElementRef::Name("Fire".into()));
        assert_eq!(ElementRef::parse("#"), ElementRef::Name("#".into()));
        assert_eq!(
            ElementRef::parse("#1 fan"),
            ElementRef::Name("#1 fan".into())
        );
    }

    #[test]
    fn credited_users() {
        let mut extra = IndexSet::new();
        extra.insert(UserId(3));
        let element = Element {
            id: ElementId(5),
            name: ElementName::new("Steam").unwrap(),
            author: Some(UserId(1)),
            extra_authors: extra,
            mark: None,
            color: None,
            image: None,
            icon: None,
            created: 1_700_000_000,
            origin: None,
            credits: AttributeCredits::default(),
        };
        assert!(element.is_credited(UserId(1)));
        assert!(element.is_credited(UserId(3)));
        assert!(!element.is_credited(UserId(2)));
        assert!(!element.is_origin());
        assert_eq!(element.to_string(), "Steam (#5)");
    }
}
