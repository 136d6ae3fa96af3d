//! Validated payload newtypes
//!
//! Every value a poll can carry is validated when it is built, so a poll
//! admitted into the pending set never stores a malformed payload.

use crate::ids::UserId;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a mark, in characters
pub const MAX_MARK_LEN: usize = 3000;

/// Maximum number of collaborators on one element
pub const MAX_COLLABORATORS: usize = 10;

/// Maximum length of an element name, in characters
pub const MAX_NAME_LEN: usize = 256;

/// Content types accepted for element images and icons
pub const IMAGE_CONTENT_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/jpg"];

/// Payload validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// Element name is empty after trimming
    #[error("element name is empty")]
    EmptyName,

    /// Element name exceeds the length cap
    #[error("element name is {len} characters long (max {max})")]
    NameTooLong { len: usize, max: usize },

    /// Element name spans multiple lines
    #[error("element name must be a single line")]
    MultilineName,

    /// Mark exceeds the length cap
    #[error("mark is {len} characters long (max {max})")]
    MarkTooLong { len: usize, max: usize },

    /// Color is not a `#rrggbb` code
    #[error("invalid hex color: {0:?}")]
    InvalidColor(String),

    /// Image link is not an http(s) URL
    #[error("invalid image link: {0:?}")]
    InvalidImageUrl(String),

    /// Attachment or remote resource is not a supported image
    #[error("unsupported image content type: {0:?}")]
    UnsupportedContentType(String),

    /// Collaborator list is empty
    #[error("no eligible collaborators given")]
    NoCollaborators,

    /// Collaborator list exceeds the cap
    #[error("{count} collaborators requested (max {max})")]
    TooManyCollaborators { count: usize, max: usize },

    /// A raw user id did not resolve to a confirmed account
    #[error("unknown user: {0}")]
    UnknownUser(u64),

    /// Combination has fewer than two inputs
    #[error("a combination needs at least 2 elements, got {0}")]
    CombinationTooSmall(usize),
}

/// Element display name
///
/// Trimmed, non-empty, single line and at most [`MAX_NAME_LEN`] characters.
/// Names compare case-insensitively through [`ElementName::key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ElementName(String);

impl ElementName {
    /// Validate a new element name
    ///
    /// # Errors
    /// - `PayloadError::EmptyName` if blank
    /// - `PayloadError::MultilineName` if it contains a line break
    /// - `PayloadError::NameTooLong` if over the cap
    pub fn new(raw: impl AsRef<str>) -> Result<Self, PayloadError> {
        let name = raw.as_ref().trim();
        if name.is_empty() {
            return Err(PayloadError::EmptyName);
        }
        if name.contains(['\n', '\r']) {
            return Err(PayloadError::MultilineName);
        }
        let len = name.chars().count();
        if len > MAX_NAME_LEN {
            return Err(PayloadError::NameTooLong {
                len,
                max: MAX_NAME_LEN,
            });
        }
        Ok(Self(name.to_string()))
    }

    /// Name as entered
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-folded lookup key
    #[inline]
    #[must_use]
    pub fn key(&self) -> String {
        Self::fold(&self.0)
    }

    /// Case-fold arbitrary user input the same way names are keyed
    #[inline]
    #[must_use]
    pub fn fold(raw: &str) -> String {
        raw.trim().to_lowercase()
    }
}

impl fmt::Display for ElementName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ElementName {
    type Error = PayloadError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ElementName> for String {
    fn from(value: ElementName) -> Self {
        value.0
    }
}

/// Free-text annotation on an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Mark(String);

impl Mark {
    /// Validate a mark
    ///
    /// # Errors
    /// `PayloadError::MarkTooLong` if over [`MAX_MARK_LEN`] characters
    pub fn new(text: impl Into<String>) -> Result<Self, PayloadError> {
        let text = text.into();
        let len = text.chars().count();
        if len > MAX_MARK_LEN {
            return Err(PayloadError::MarkTooLong {
                len,
                max: MAX_MARK_LEN,
            });
        }
        Ok(Self(text))
    }

    /// Mark text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Mark {
    type Error = PayloadError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Mark> for String {
    fn from(value: Mark) -> Self {
        value.0
    }
}

/// Six-digit hex color, stored lowercase with the leading `#`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    /// Parse a `#rrggbb` code (case-insensitive)
    ///
    /// # Errors
    /// `PayloadError::InvalidColor` for anything else
    pub fn parse(raw: &str) -> Result<Self, PayloadError> {
        let raw = raw.trim();
        let digits = raw
            .strip_prefix('#')
            .ok_or_else(|| PayloadError::InvalidColor(raw.to_string()))?;
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(PayloadError::InvalidColor(raw.to_string()));
        }
        Ok(Self(format!("#{}", digits.to_ascii_lowercase())))
    }

    /// Color code with `#`
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for HexColor {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl TryFrom<String> for HexColor {
    type Error = PayloadError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(value: HexColor) -> Self {
        value.0
    }
}

/// Link to an element image or icon
///
/// [`ImageUrl::parse`] only checks the shape of the link; remote links must
/// additionally pass the content-type check performed by the image
/// validator before a poll is built from them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageUrl(String);

impl ImageUrl {
    /// Check that a link is an absolute http(s) URL without whitespace
    ///
    /// # Errors
    /// `PayloadError::InvalidImageUrl` otherwise
    pub fn parse(raw: &str) -> Result<Self, PayloadError> {
        let raw = raw.trim();
        let rest = raw
            .strip_prefix("https://")
            .or_else(|| raw.strip_prefix("http://"));
        match rest {
            Some(host_and_path) if !host_and_path.is_empty() && !raw.contains(char::is_whitespace) => {
                Ok(Self(raw.to_string()))
            }
            _ => Err(PayloadError::InvalidImageUrl(raw.to_string())),
        }
    }

    /// Accept an uploaded attachment by its declared content type
    ///
    /// # Errors
    /// - `PayloadError::UnsupportedContentType` for non-image uploads
    /// - `PayloadError::InvalidImageUrl` for malformed links
    pub fn from_attachment(url: &str, content_type: &str) -> Result<Self, PayloadError> {
        if !Self::is_supported_content_type(content_type) {
            return Err(PayloadError::UnsupportedContentType(content_type.to_string()));
        }
        Self::parse(url)
    }

    /// Whether a content type is an accepted image format
    #[inline]
    #[must_use]
    pub fn is_supported_content_type(content_type: &str) -> bool {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        IMAGE_CONTENT_TYPES
            .iter()
            .any(|t| t.eq_ignore_ascii_case(essence))
    }

    /// Link text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ImageUrl {
    type Error = PayloadError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ImageUrl> for String {
    fn from(value: ImageUrl) -> Self {
        value.0
    }
}

/// Deduplicated, capped, non-empty list of collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<UserId>", into = "Vec<UserId>")]
pub struct CollaboratorSet(IndexSet<UserId>);

impl CollaboratorSet {
    /// Build a set, dropping duplicates while keeping first-seen order
    ///
    /// # Errors
    /// - `PayloadError::NoCollaborators` if empty
    /// - `PayloadError::TooManyCollaborators` if over [`MAX_COLLABORATORS`]
    pub fn new(users: impl IntoIterator<Item = UserId>) -> Result<Self, PayloadError> {
        let set: IndexSet<UserId> = users.into_iter().collect();
        if set.is_empty() {
            return Err(PayloadError::NoCollaborators);
        }
        if set.len() > MAX_COLLABORATORS {
            return Err(PayloadError::TooManyCollaborators {
                count: set.len(),
                max: MAX_COLLABORATORS,
            });
        }
        Ok(Self(set))
    }

    /// Number of users
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty; never true for a constructed set
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Membership check
    #[inline]
    #[must_use]
    pub fn contains(&self, user: UserId) -> bool {
        self.0.contains(&user)
    }

    /// Iterate in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = UserId> + '_ {
        self.0.iter().copied()
    }
}

impl TryFrom<Vec<UserId>> for CollaboratorSet {
    type Error = PayloadError;

    fn try_from(value: Vec<UserId>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CollaboratorSet> for Vec<UserId> {
    fn from(value: CollaboratorSet) -> Self {
        value.0.into_iter().collect()
    }
}
