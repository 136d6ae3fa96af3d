//! Opaque identifiers
//!
//! Platform identities are reduced to plain integers before they reach the
//! core; the presentation layer owns the mapping back to accounts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw integer value
            #[inline]
            #[must_use]
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().trim_start_matches($prefix).parse().map(Self)
            }
        }
    };
}

numeric_id!(
    /// Platform user identifier
    UserId,
    ""
);

numeric_id!(
    /// Element identifier, assigned once in strictly increasing order
    ElementId,
    "#"
);

numeric_id!(
    /// Poll identifier, monotonically increasing within one community
    PollId,
    "poll-"
);

numeric_id!(
    /// Community (game instance) identifier
    CommunityId,
    ""
);
