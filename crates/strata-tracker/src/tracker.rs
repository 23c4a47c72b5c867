use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use strata_store::NodeStore;
use strata_types::{ConsumerId, ContentId};

use crate::error::{TrackerError, TrackerResult};

/// Tracks, per content node, the live consumers that depend on it.
///
/// Adding and removing are idempotent: adding a handle twice keeps one
/// entry, removing an absent handle is a no-op. Child dependencies are not
/// stored here; [`has_child`](Self::has_child) asks the node store.
pub struct ReferenceTracker {
    nodes: Arc<dyn NodeStore>,
    consumers: RwLock<HashMap<ContentId, HashSet<ConsumerId>>>,
}

impl ReferenceTracker {
    pub fn new(nodes: Arc<dyn NodeStore>) -> Self {
        Self {
            nodes,
            consumers: RwLock::new(HashMap::new()),
        }
    }

    /// Declare that `consumer` depends on `id`.
    ///
    /// Returns `true` if the handle was not already registered.
    pub fn add_consumer(&self, id: ContentId, consumer: ConsumerId) -> TrackerResult<bool> {
        let mut map = self.write()?;
        let added = map.entry(id).or_default().insert(consumer.clone());
        if added {
            debug!(node = %id.short_hex(), consumer = %consumer.short_id(), "consumer added");
        }
        Ok(added)
    }

    /// Withdraw `consumer`'s dependency on `id`.
    ///
    /// Returns `true` if the handle was registered.
    pub fn remove_consumer(&self, id: &ContentId, consumer: &ConsumerId) -> TrackerResult<bool> {
        let mut map = self.write()?;
        let Some(set) = map.get_mut(id) else {
            return Ok(false);
        };
        let removed = set.remove(consumer);
        if set.is_empty() {
            map.remove(id);
        }
        if removed {
            debug!(node = %id.short_hex(), consumer = %consumer.short_id(), "consumer removed");
        }
        Ok(removed)
    }

    /// Returns `true` if any consumer depends on `id`.
    pub fn has_consumers(&self, id: &ContentId) -> TrackerResult<bool> {
        Ok(self.read()?.get(id).is_some_and(|set| !set.is_empty()))
    }

    /// Consumers of `id`, sorted.
    pub fn consumers(&self, id: &ContentId) -> TrackerResult<Vec<ConsumerId>> {
        let map = self.read()?;
        let mut list: Vec<ConsumerId> = map
            .get(id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        list.sort();
        Ok(list)
    }

    /// Number of consumers of `id`.
    pub fn consumer_count(&self, id: &ContentId) -> TrackerResult<usize> {
        Ok(self.read()?.get(id).map_or(0, HashSet::len))
    }

    /// Every node with at least one consumer, sorted.
    pub fn consumed(&self) -> TrackerResult<Vec<ContentId>> {
        let mut ids: Vec<ContentId> = self.read()?.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    /// Returns `true` if any node in the store names `id` as parent.
    pub fn has_child(&self, id: &ContentId) -> TrackerResult<bool> {
        Ok(self.nodes.has_children(id)?)
    }

    fn read(&self) -> TrackerResult<RwLockReadGuard<'_, HashMap<ContentId, HashSet<ConsumerId>>>> {
        self.consumers
            .read()
            .map_err(|e| TrackerError::LockPoisoned(e.to_string()))
    }

    fn write(
        &self,
    ) -> TrackerResult<RwLockWriteGuard<'_, HashMap<ContentId, HashSet<ConsumerId>>>> {
        self.consumers
            .write()
            .map_err(|e| TrackerError::LockPoisoned(e.to_string()))
    }
}

impl std::fmt::Debug for ReferenceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let consumed = self.read().map(|m| m.len()).unwrap_or_default();
        f.debug_struct("ReferenceTracker")
            .field("consumed_nodes", &consumed)
            .finish()
    }
}
