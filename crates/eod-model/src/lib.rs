//! EOD Model
//!
//! Value types shared by every layer of the element graph engine.
//!
//! # Overview
//!
//! - **Identifiers**: [`UserId`], [`ElementId`], [`PollId`], [`CommunityId`]
//! - **User**: identity plus inventory of owned elements
//! - **Element**: a named graph node with provenance and cosmetic attributes
//! - **Payloads**: validated newtypes ([`Mark`], [`HexColor`], [`ImageUrl`],
//!   [`CollaboratorSet`], [`ElementName`]) that can only hold valid values
//! - **Combination**: unordered multiset of inputs for a recipe edge
//!
//! # Example
//!
//! ```rust
//! use eod_model::{HexColor, Mark};
//!
//! let color = HexColor::parse("#00FFAA").unwrap();
//! assert_eq!(color.as_str(), "#00ffaa");
//!
//! assert!(Mark::new("x".repeat(3001)).is_err());
//! ```

#![warn(missing_docs)]

pub mod combination;
pub mod element;
pub mod ids;
pub mod payload;
pub mod user;

// Re-exports
pub use combination::Combination;
pub use element::{AttributeCredits, Element, ElementAttributes, ElementRef, ORIGIN_TIMESTAMP};
pub use ids::{CommunityId, ElementId, PollId, UserId};
pub use payload::{
    CollaboratorSet, ElementName, HexColor, ImageUrl, Mark, PayloadError, IMAGE_CONTENT_TYPES,
    MAX_COLLABORATORS, MAX_MARK_LEN, MAX_NAME_LEN,
};
pub use user::User;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with model types
    pub use crate::{
        CollaboratorSet, Combination, Element, ElementId, ElementName, ElementRef, HexColor,
        ImageUrl, Mark, PayloadError, User, UserId,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
