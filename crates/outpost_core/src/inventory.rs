//! Item storage and downstream transport.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resources::ResourceId;

/// Per-resource item counts held inside a block.
///
/// Capacity is enforced by the owning block, not by the storage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemStorage {
    items: BTreeMap<ResourceId, u32>,
}

impl ItemStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Units of `resource` held.
    #[must_use]
    pub fn get(&self, resource: ResourceId) -> u32 {
        self.items.get(&resource).copied().unwrap_or(0)
    }

    /// Add units of `resource`.
    pub fn add(&mut self, resource: ResourceId, amount: u32) {
        if amount == 0 {
            return;
        }
        *self.items.entry(resource).or_insert(0) += amount;
    }

    /// Remove up to `amount` units. Returns how many were removed.
    pub fn remove(&mut self, resource: ResourceId, amount: u32) -> u32 {
        let Some(held) = self.items.get_mut(&resource) else {
            return 0;
        };
        let removed = amount.min(*held);
        *held -= removed;
        if *held == 0 {
            self.items.remove(&resource);
        }
        removed
    }

    /// Total units across all resources.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.items.values().sum()
    }

    /// Check if nothing is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Held resources in id order, with counts.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, u32)> + '_ {
        self.items.iter().map(|(id, count)| (*id, *count))
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Downstream transport that blocks dump items into.
pub trait ItemSink {
    /// Offer one unit. Returns true if it was taken.
    fn accept(&mut self, resource: ResourceId) -> bool;
}

/// Sink that refuses everything, as when a drill has no conveyor attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ItemSink for NullSink {
    fn accept(&mut self, _resource: ResourceId) -> bool {
        false
    }
}

/// Sink that buffers what it receives, optionally up to a total limit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BufferSink {
    /// Received items.
    pub received: ItemStorage,
    /// Maximum total items accepted; `None` for unbounded.
    pub limit: Option<u32>,
}

impl BufferSink {
    /// Unbounded sink.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Sink that stops accepting after `limit` items.
    #[must_use]
    pub fn with_limit(limit: u32) -> Self {
        Self {
            received: ItemStorage::new(),
            limit: Some(limit),
        }
    }
}

impl ItemSink for BufferSink {
    fn accept(&mut self, resource: ResourceId) -> bool {
        if self.limit.is_some_and(|limit| self.received.total() >= limit) {
            return false;
        }
        self.received.add(resource, 1);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_add_remove() {
        let mut storage = ItemStorage::new();
        storage.add(ResourceId(1), 3);
        storage.add(ResourceId(2), 1);
        assert_eq!(storage.total(), 4);

        assert_eq!(storage.remove(ResourceId(1), 5), 3);
        assert_eq!(storage.get(ResourceId(1)), 0);
        assert_eq!(storage.iter().collect::<Vec<_>>(), vec![(ResourceId(2), 1)]);
        assert_eq!(storage.remove(ResourceId(9), 1), 0);
    }

    #[test]
    fn test_buffer_sink_limit() {
        let mut sink = BufferSink::with_limit(2);
        assert!(sink.accept(ResourceId(0)));
        assert!(sink.accept(ResourceId(0)));
        assert!(!sink.accept(ResourceId(0)));
        assert_eq!(sink.received.get(ResourceId(0)), 2);

        assert!(!NullSink.accept(ResourceId(0)));
    }
}
