//! Effective configuration view for `check-config`

use eod_core::{ConfigError, GameConfig, ManagerConfig};
use eod_model::CommunityId;
use serde::Serialize;
use std::collections::BTreeMap;

/// Defaults plus the fully layered ruleset of every listed community
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveConfig {
    /// Ruleset for unlisted communities
    pub defaults: GameConfig,
    /// Effective ruleset keyed by community id
    pub communities: BTreeMap<u64, GameConfig>,
}

impl EffectiveConfig {
    /// Resolve every override against the defaults
    ///
    /// # Errors
    /// Whatever [`ManagerConfig::validate`] reports, such as a non-numeric
    /// or repeated community key
    pub fn resolve(config: &ManagerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let communities: BTreeMap<u64, GameConfig> = config
            .communities
            .keys()
            .map(|key| {
                let id = key
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidCommunityId(key.clone()))?;
                Ok((id, config.for_community(CommunityId(id))))
            })
            .collect::<Result<_, ConfigError>>()?;
        Ok(Self {
            defaults: config.defaults.clone(),
            communities,
        })
    }

    /// Pretty JSON rendering
    ///
    /// # Errors
    /// Serialization failure
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
