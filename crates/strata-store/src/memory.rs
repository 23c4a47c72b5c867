use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use strata_types::ContentId;

use crate::error::{StoreError, StoreResult};
use crate::node::ContentNode;
use crate::traits::NodeStore;

/// In-memory, HashMap-based node store.
///
/// Nodes and the reverse child index live behind one `RwLock`, so a reader
/// never sees a node without its index entry or the other way round.
pub struct InMemoryNodeStore {
    inner: RwLock<NodeState>,
}

#[derive(Default)]
struct NodeState {
    nodes: HashMap<ContentId, ContentNode>,
    /// Reverse index: parent -> children.
    children: HashMap<ContentId, BTreeSet<ContentId>>,
}

impl InMemoryNodeStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(NodeState::default()),
        }
    }

    /// Number of nodes currently stored.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.nodes.len())
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.read()?.nodes.is_empty())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, NodeState>> {
        self.inner
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, NodeState>> {
        self.inner
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl Default for InMemoryNodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore for InMemoryNodeStore {
    fn create(&self, node: ContentNode) -> StoreResult<ContentId> {
        let id = node.id;
        if node.parent == Some(id) {
            return Err(StoreError::SelfParent(id));
        }

        let mut state = self.write()?;
        if let Some(existing) = state.nodes.get(&id) {
            // Same ID, same parent: the content is identical by construction.
            if existing.parent == node.parent {
                return Ok(id);
            }
            return Err(StoreError::Conflict(id));
        }

        if let Some(parent) = node.parent {
            if !state.nodes.contains_key(&parent) {
                return Err(StoreError::InvalidParent { node: id, parent });
            }
            state.children.entry(parent).or_default().insert(id);
        }

        debug!(node = %id.short_hex(), parent = ?node.parent.map(|p| p.short_hex()), "created node");
        state.nodes.insert(id, node);
        Ok(id)
    }

    fn get(&self, id: &ContentId) -> StoreResult<Option<ContentNode>> {
        Ok(self.read()?.nodes.get(id).cloned())
    }

    fn exists(&self, id: &ContentId) -> StoreResult<bool> {
        Ok(self.read()?.nodes.contains_key(id))
    }

    fn delete(&self, id: &ContentId) -> StoreResult<ContentNode> {
        let mut state = self.write()?;
        if !state.nodes.contains_key(id) {
            return Err(StoreError::NotFound(*id));
        }
        if let Some(children) = state.children.get(id) {
            if !children.is_empty() {
                return Err(StoreError::StillReferenced {
                    id: *id,
                    children: children.len(),
                });
            }
        }

        let node = state.nodes.remove(id).ok_or(StoreError::NotFound(*id))?;
        state.children.remove(id);
        if let Some(parent) = node.parent {
            if let Some(siblings) = state.children.get_mut(&parent) {
                siblings.remove(id);
                if siblings.is_empty() {
                    state.children.remove(&parent);
                }
            }
        }

        debug!(node = %id.short_hex(), "deleted node");
        Ok(node)
    }

    fn children(&self, id: &ContentId) -> StoreResult<Vec<ContentId>> {
        let state = self.read()?;
        Ok(state
            .children
            .get(id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    fn has_children(&self, id: &ContentId) -> StoreResult<bool> {
        let state = self.read()?;
        Ok(state.children.get(id).is_some_and(|set| !set.is_empty()))
    }

    fn all_ids(&self) -> StoreResult<Vec<ContentId>> {
        let state = self.read()?;
        let mut ids: Vec<ContentId> = state.nodes.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

impl std::fmt::Debug for InMemoryNodeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len().unwrap_or_default();
        f.debug_struct("InMemoryNodeStore")
            .field("node_count", &count)
            .finish()
    }
}
