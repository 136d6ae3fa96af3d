//! EOD Database
//!
//! Authoritative element graph of one community.
//!
//! # Overview
//!
//! - **Database**: name index, id index, recipe edges and user registry
//!   behind one lock
//! - **Mutation**: an approved change, applied all-or-nothing
//! - **ElementInfo**: read-only info card (made with, used in, found by,
//!   tree size)
//! - **DatabaseSnapshot**: serializable state, re-validated on restore
//!
//! # Example
//!
//! ```rust
//! use eod_database::{Database, Mutation};
//! use eod_model::{Combination, ElementId, ElementName, UserId};
//!
//! let starters = ["Air", "Earth", "Fire", "Water"].map(|n| ElementName::new(n).unwrap());
//! let db = Database::new(starters, None).unwrap();
//!
//! let steam = Combination::new([ElementId(3), ElementId(4)]).unwrap();
//! db.apply_mutation(&Mutation::CreateElement {
//!     combination: steam.clone(),
//!     name: ElementName::new("Steam").unwrap(),
//!     author: UserId(1),
//! })
//! .unwrap();
//!
//! assert_eq!(db.find_recipe(&steam).unwrap().name.as_str(), "Steam");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod info;
pub mod mutation;
pub mod snapshot;
pub mod store;

// Re-exports
pub use error::DatabaseError;
pub use info::ElementInfo;
pub use mutation::{Applied, Mutation};
pub use snapshot::{DatabaseSnapshot, RecipeEdge};
pub use store::Database;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for database operations
    pub use crate::{Applied, Database, DatabaseError, DatabaseSnapshot, ElementInfo, Mutation};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
