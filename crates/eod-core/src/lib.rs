//! EOD Core
//!
//! Multi-community game engine: each community gets its own element graph,
//! poll queue and ruleset, and polls turn votes into graph changes.
//!
//! # Overview
//!
//! - **GameInstance**: one community's database plus its pending polls
//! - **InstanceManager**: at most one instance per community, built lazily
//! - **GameConfig / ManagerConfig**: TOML defaults with per-community overrides
//! - **GameEvent**: admissions and resolutions, broadcast after locks drop
//! - **ImageValidator / IdentityResolver**: async checks run before a poll
//!   is built
//!
//! # Example
//!
//! ```rust
//! use eod_core::{InstanceManager, ManagerConfig};
//! use eod_model::{CommunityId, UserId};
//! use eod_poll::{Poll, PollKind, PollStatus};
//!
//! let config = ManagerConfig::from_toml_str("[defaults]\nvote_req = 1\n").unwrap();
//! let manager = InstanceManager::new(config);
//! let game = manager.get_or_create_default(CommunityId(42)).unwrap();
//!
//! let fire = game.check_element("fire").unwrap();
//! let poll = game
//!     .suggest_poll(Poll::new(UserId(1), PollKind::mark(&fire, "Hot.").unwrap()))
//!     .unwrap();
//! let poll = game.vote(poll.id(), UserId(2)).unwrap();
//!
//! assert_eq!(poll.status(), PollStatus::Accepted);
//! assert_eq!(game.check_element("Fire").unwrap().mark.unwrap().as_str(), "Hot.");
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod events;
pub mod instance;
pub mod manager;
pub mod parse;
pub mod telemetry;
pub mod validators;

// Re-exports
pub use config::{ChannelList, ConfigError, GameConfig, GameConfigOverride, ManagerConfig};
pub use error::GameError;
pub use events::GameEvent;
pub use instance::{AdminClose, CombineOutcome, GameInstance, InstanceSnapshot};
pub use manager::InstanceManager;
pub use parse::parse_element_list;
pub use telemetry::LogFormat;
pub use validators::{
    check_head_response, resolve_collaborators, HttpImageValidator, IdentityResolver, ImageValidator,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for game operations
    pub use crate::{
        AdminClose, GameConfig, GameError, GameEvent, GameInstance, InstanceManager, ManagerConfig,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
