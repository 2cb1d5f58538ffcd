//! Resource descriptors.
//!
//! Descriptors are read-only to the blocks: a drill only needs a stable
//! identity to key its maps and a hardness value to size its timers.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::data::ResourceData;
use crate::error::{GameError, Result};

/// Stable identity of a resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ResourceId(pub u16);

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "resource#{}", self.0)
    }
}

/// A registered resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Runtime identity.
    pub id: ResourceId,
    /// Data key (e.g. `"copper"`).
    pub key: String,
    /// Lengthens extraction time; zero for the softest ores.
    pub hardness: u32,
}

/// Hardest ore a registry accepts.
pub const MAX_HARDNESS: u32 = 10_000;

/// All known resource types.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceRegistry {
    resources: BTreeMap<ResourceId, Resource>,
    by_key: HashMap<String, ResourceId>,
}

impl ResourceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from data definitions, assigning ids in list order.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] on duplicate or empty keys.
    pub fn from_data(data: &[ResourceData]) -> Result<Self> {
        let mut registry = Self::new();
        for entry in data {
            registry.register(&entry.id, entry.hardness)?;
        }
        Ok(registry)
    }

    /// Register a resource and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] on duplicate or empty keys, a
    /// hardness above [`MAX_HARDNESS`], or when the id space is exhausted.
    pub fn register(&mut self, key: &str, hardness: u32) -> Result<ResourceId> {
        if key.is_empty() {
            return Err(GameError::invalid_config("resource", "empty resource key"));
        }
        if hardness > MAX_HARDNESS {
            return Err(GameError::invalid_config(
                key,
                format!("hardness {hardness} exceeds {MAX_HARDNESS}"),
            ));
        }
        if self.by_key.contains_key(key) {
            return Err(GameError::invalid_config(
                key,
                "resource registered twice",
            ));
        }

        let next = u16::try_from(self.resources.len())
            .map_err(|_| GameError::invalid_config(key, "too many resource types"))?;
        let id = ResourceId(next);
        self.resources.insert(
            id,
            Resource {
                id,
                key: key.to_string(),
                hardness,
            },
        );
        self.by_key.insert(key.to_string(), id);
        Ok(id)
    }

    /// Look up a resource by id.
    #[must_use]
    pub fn get(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(&id)
    }

    /// Look up a resource id by key.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownResource`] if the key is not registered.
    pub fn id_of(&self, key: &str) -> Result<ResourceId> {
        self.by_key
            .get(key)
            .copied()
            .ok_or_else(|| GameError::UnknownResource(key.to_string()))
    }

    /// Hardness of a resource; unknown ids count as the softest.
    #[must_use]
    pub fn hardness(&self, id: ResourceId) -> u32 {
        self.get(id).map_or(0, |r| r.hardness)
    }

    /// Key of a resource, for logs and reports.
    #[must_use]
    pub fn key(&self, id: ResourceId) -> &str {
        self.get(id).map_or("unknown", |r| r.key.as_str())
    }

    /// Iterate resources in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Number of registered resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
