//! Per-community configuration
//!
//! A [`ManagerConfig`] is loaded once per process from TOML:
//!
//! ```toml
//! [defaults]
//! vote_req = 3
//! poll_limit = 21
//!
//! [communities."123456"]
//! vote_req = 1
//! reject_req = 2
//! ```
//!
//! Each community table overrides only the keys it names. The effective
//! [`GameConfig`] is resolved when an instance is built and never changes
//! for that instance afterwards.

use eod_model::{CommunityId, ElementName, PayloadError, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Default starter elements
pub const DEFAULT_STARTERS: [&str; 4] = ["Air", "Earth", "Fire", "Water"];

/// Default maximum number of pending polls
pub const DEFAULT_POLL_LIMIT: usize = 21;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Community table key is not a numeric id
    #[error("invalid community id {0:?}")]
    InvalidCommunityId(String),

    /// Two community table keys name the same id, e.g. "1" and "01"
    #[error("community {id} is configured twice ({first:?} and {second:?})")]
    DuplicateCommunityId {
        id: u64,
        first: String,
        second: String,
    },

    /// Starter element name is invalid
    #[error("invalid starter element {name:?}: {source}")]
    InvalidStarter {
        name: String,
        #[source]
        source: PayloadError,
    },

    /// A value is out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Channel ids the presentation layer posts to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChannelList {
    /// Where resolutions are announced
    pub news: Option<u64>,
    /// Where polls are posted for voting
    pub voting: Option<u64>,
    /// Where players may combine elements
    pub play: Vec<u64>,
}

/// Ruleset of one community
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Votes in favour needed to accept; 0 accepts on admission
    pub vote_req: usize,
    /// Maximum simultaneously pending polls
    pub poll_limit: usize,
    /// Votes against needed to reject; `None` disables downvote rejection
    pub reject_req: Option<usize>,
    /// Seconds before a pending poll expires; `None` keeps polls open
    pub poll_ttl_secs: Option<u64>,
    /// Elements every new database starts with
    pub starter_elements: Vec<String>,
    /// Bot account that can never be credited
    pub system_user: Option<UserId>,
    /// Presentation channels
    pub channels: ChannelList,
}

impl GameConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With vote requirement
    #[inline]
    #[must_use]
    pub fn with_vote_req(mut self, vote_req: usize) -> Self {
        self.vote_req = vote_req;
        self
    }

    /// With poll limit
    #[inline]
    #[must_use]
    pub fn with_poll_limit(mut self, poll_limit: usize) -> Self {
        self.poll_limit = poll_limit;
        self
    }

    /// With downvote rejection threshold
    #[inline]
    #[must_use]
    pub fn with_reject_req(mut self, reject_req: usize) -> Self {
        self.reject_req = Some(reject_req);
        self
    }

    /// With poll time to live
    #[inline]
    #[must_use]
    pub fn with_poll_ttl_secs(mut self, secs: u64) -> Self {
        self.poll_ttl_secs = Some(secs);
        self
    }

    /// With starter elements
    #[must_use]
    pub fn with_starters<S: Into<String>>(mut self, starters: impl IntoIterator<Item = S>) -> Self {
        self.starter_elements = starters.into_iter().map(Into::into).collect();
        self
    }

    /// With system account
    #[inline]
    #[must_use]
    pub fn with_system_user(mut self, user: UserId) -> Self {
        self.system_user = Some(user);
        self
    }

    /// Validated starter names
    ///
    /// # Errors
    /// `ConfigError::InvalidStarter` or `ConfigError::Invalid` on duplicates
    pub fn starter_names(&self) -> Result<Vec<ElementName>, ConfigError> {
        let mut seen = HashSet::new();
        self.starter_elements
            .iter()
            .map(|raw| {
                let name = ElementName::new(raw).map_err(|source| ConfigError::InvalidStarter {
                    name: raw.clone(),
                    source,
                })?;
                if !seen.insert(name.key()) {
                    return Err(ConfigError::Invalid(format!(
                        "starter element {raw:?} is listed twice"
                    )));
                }
                Ok(name)
            })
            .collect()
    }

    /// Check value ranges
    ///
    /// # Errors
    /// The first invalid setting
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_limit == 0 {
            return Err(ConfigError::Invalid("poll_limit must be at least 1".into()));
        }
        if self.reject_req == Some(0) {
            return Err(ConfigError::Invalid("reject_req must be at least 1".into()));
        }
        if self.poll_ttl_secs == Some(0) {
            return Err(ConfigError::Invalid("poll_ttl_secs must be at least 1".into()));
        }
        self.starter_names().map(|_| ())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            vote_req: 0,
            poll_limit: DEFAULT_POLL_LIMIT,
            reject_req: None,
            poll_ttl_secs: None,
            starter_elements: DEFAULT_STARTERS.iter().map(ToString::to_string).collect(),
            system_user: None,
            channels: ChannelList::default(),
        }
    }
}

/// Per-community overrides; unset keys fall back to `[defaults]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfigOverride {
    /// See [`GameConfig::vote_req`]
    pub vote_req: Option<usize>,
    /// See [`GameConfig::poll_limit`]
    pub poll_limit: Option<usize>,
    /// See [`GameConfig::reject_req`]
    pub reject_req: Option<usize>,
    /// See [`GameConfig::poll_ttl_secs`]
    pub poll_ttl_secs: Option<u64>,
    /// See [`GameConfig::starter_elements`]
    pub starter_elements: Option<Vec<String>>,
    /// See [`GameConfig::system_user`]
    pub system_user: Option<UserId>,
    /// See [`GameConfig::channels`]
    pub channels: Option<ChannelList>,
}

impl GameConfigOverride {
    /// Layer these overrides onto `base`
    #[must_use]
    pub fn apply(&self, base: &GameConfig) -> GameConfig {
        let mut config = base.clone();
        if let Some(v) = self.vote_req {
            config.vote_req = v;
        }
        if let Some(v) = self.poll_limit {
            config.poll_limit = v;
        }
        if self.reject_req.is_some() {
            config.reject_req = self.reject_req;
        }
        if self.poll_ttl_secs.is_some() {
            config.poll_ttl_secs = self.poll_ttl_secs;
        }
        if let Some(v) = &self.starter_elements {
            config.starter_elements.clone_from(v);
        }
        if self.system_user.is_some() {
            config.system_user = self.system_user;
        }
        if let Some(v) = &self.channels {
            config.channels = v.clone();
        }
        config
    }
}

/// Process-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManagerConfig {
    /// Ruleset for communities without overrides
    pub defaults: GameConfig,
    /// Overrides keyed by community id
    pub communities: BTreeMap<String, GameConfigOverride>,
}

impl ManagerConfig {
    /// Parse and validate TOML text
    ///
    /// # Errors
    /// Parse failures, non-numeric community keys or invalid settings
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// `ConfigError::Io` if unreadable, otherwise as [`Self::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(
            path = %path.display(),
            communities = config.communities.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Validate defaults and every community's effective config
    ///
    /// # Errors
    /// The first invalid setting
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.defaults.validate()?;
        let mut seen: BTreeMap<u64, &String> = BTreeMap::new();
        for (key, overrides) in &self.communities {
            let id = key
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidCommunityId(key.clone()))?;
            if let Some(first) = seen.insert(id, key) {
                return Err(ConfigError::DuplicateCommunityId {
                    id,
                    first: first.clone(),
                    second: key.clone(),
                });
            }
            overrides.apply(&self.defaults).validate()?;
        }
        Ok(())
    }

    /// Effective config for a community
    #[must_use]
    pub fn for_community(&self, id: CommunityId) -> GameConfig {
        self.communities
            .iter()
            .find(|(key, _)| key.trim().parse::<u64>().ok() == Some(id.get()))
            .map_or_else(|| self.defaults.clone(), |(_, o)| o.apply(&self.defaults))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_classic_rules() {
        let config = GameConfig::default();
        assert_eq!(config.vote_req, 0);
        assert_eq!(config.poll_limit, 21);
        assert_eq!(config.starter_elements, ["Air", "Earth", "Fire", "Water"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn community_overrides_only_named_keys() {
        let config = ManagerConfig::from_toml_str(
            r#"
            [defaults]
            vote_req = 3
            poll_limit = 5

            [communities."42"]
            vote_req = 1
            reject_req = 2

            [communities."42".channels]
            news = 900
            "#,
        )
        .unwrap();

        let c42 = config.for_community(CommunityId(42));
        assert_eq!(c42.vote_req, 1);
        assert_eq!(c42.poll_limit, 5);
        assert_eq!(c42.reject_req, Some(2));
        assert_eq!(c42.channels.news, Some(900));

        let other = config.for_community(CommunityId(7));
        assert_eq!(other.vote_req, 3);
        assert_eq!(other.reject_req, None);
    }

    #[test]
    fn zero_poll_limit_rejected() {
        let err = ManagerConfig::from_toml_str("[defaults]\npoll_limit = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn bad_community_key_rejected() {
        let err = ManagerConfig::from_toml_str("[communities.main]\nvote_req = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCommunityId(k) if k == "main"));
    }

    #[test]
    fn community_keys_naming_one_id_rejected() {
        let err = ManagerConfig::from_toml_str(
            "[communities.\"1\"]\nvote_req = 1\n\n[communities.\"01\"]\nvote_req = 9\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicateCommunityId { id: 1, ref first, ref second }
                if first == "01" && second == "1"
        ));
    }

    #[test]
    fn duplicate_starters_rejected() {
        let config = GameConfig::new().with_starters(["Air", "air"]);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        let config = GameConfig::new().with_starters(["Air", " "]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidStarter { .. })
        ));
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(matches!(
            ManagerConfig::from_toml_str("[defaults]\nvotes = 2\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eod.toml");
        std::fs::write(&path, "[defaults]\nvote_req = 4\n").unwrap();
        let config = ManagerConfig::load(&path).unwrap();
        assert_eq!(config.defaults.vote_req, 4);

        let missing = ManagerConfig::load(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
