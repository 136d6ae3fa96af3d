//! Instance registry
//!
//! [`InstanceManager`] maps community ids to their [`GameInstance`]. It is
//! created once per process and handed to every entry point; there is no
//! global. Building a second manager starts an empty registry, it does not
//! extend the first.

use crate::config::{GameConfig, ManagerConfig};
use crate::error::GameError;
use crate::instance::GameInstance;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use eod_model::CommunityId;
use std::sync::Arc;

/// Registry of game instances, one per community
#[derive(Debug, Default)]
pub struct InstanceManager {
    instances: DashMap<CommunityId, Arc<GameInstance>>,
    config: ManagerConfig,
}

impl InstanceManager {
    /// Create an empty registry
    #[inline]
    #[must_use]
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            instances: DashMap::new(),
            config,
        }
    }

    /// Process configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Return the instance for `id`, building it with `factory` if absent
    ///
    /// The check and the insert happen under one shard lock, so concurrent
    /// callers for the same id all get the same instance and `factory` runs
    /// at most once per id. `factory` must not call back into this manager.
    ///
    /// # Errors
    /// - whatever `factory` returns; nothing is registered in that case
    /// - `GameError::Internal` if `factory` builds an instance for another
    ///   community
    pub fn get_or_create<F>(&self, id: CommunityId, factory: F) -> Result<Arc<GameInstance>, GameError>
    where
        F: FnOnce(CommunityId, GameConfig) -> Result<GameInstance, GameError>,
    {
        match self.instances.entry(id) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let instance = factory(id, self.config.for_community(id))?;
                check_community(id, &instance)?;
                let instance = Arc::new(instance);
                entry.insert(Arc::clone(&instance));
                tracing::info!(community = %id, "instance registered");
                Ok(instance)
            }
        }
    }

    /// [`InstanceManager::get_or_create`] with a fresh seeded instance
    ///
    /// # Errors
    /// `GameError::Config` if the community's config is invalid
    pub fn get_or_create_default(&self, id: CommunityId) -> Result<Arc<GameInstance>, GameError> {
        self.get_or_create(id, GameInstance::new)
    }

    /// Register a prebuilt instance
    ///
    /// # Errors
    /// - `GameError::Internal` if `instance` belongs to another community
    /// - `GameError::InstanceExists` if `id` is taken
    pub fn add_instance(&self, id: CommunityId, instance: GameInstance) -> Result<Arc<GameInstance>, GameError> {
        check_community(id, &instance)?;
        match self.instances.entry(id) {
            Entry::Occupied(_) => {
                tracing::error!(community = %id, "instance overwrite refused");
                Err(GameError::InstanceExists(id))
            }
            Entry::Vacant(entry) => {
                let instance = Arc::new(instance);
                entry.insert(Arc::clone(&instance));
                Ok(instance)
            }
        }
    }

    /// Registered instance
    ///
    /// # Errors
    /// `GameError::NotFound` if absent
    pub fn get_instance(&self, id: CommunityId) -> Result<Arc<GameInstance>, GameError> {
        self.instances
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| GameError::NotFound(format!("instance {id}")))
    }

    /// Whether `id` has an instance
    #[must_use]
    pub fn has_instance(&self, id: CommunityId) -> bool {
        self.instances.contains_key(&id)
    }

    /// Number of registered instances
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether no instance is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Registered community ids, sorted
    #[must_use]
    pub fn communities(&self) -> Vec<CommunityId> {
        let mut ids: Vec<CommunityId> = self.instances.iter().map(|e| *e.key()).collect();
        ids.sort_unstable();
        ids
    }
}

fn check_community(id: CommunityId, instance: &GameInstance) -> Result<(), GameError> {
    if instance.community() == id {
        return Ok(());
    }
    tracing::error!(
        community = %id,
        instance_community = %instance.community(),
        "instance filed under the wrong community"
    );
    Err(GameError::Internal(format!(
        "instance for community {} cannot be registered as {id}",
        instance.community()
    )))
}
