use strata_types::ContentId;

use crate::error::{StoreError, StoreResult};
use crate::node::ContentNode;

/// Storage for immutable content nodes and their parent links.
///
/// All implementations must satisfy these invariants:
/// - A node's parent, if set, exists for as long as the node does.
/// - `create` with an ID that already exists is a no-op when the parent
///   matches and a [`StoreError::Conflict`] otherwise.
/// - `delete` refuses a node that still has children.
/// - Deletion never cascades to the parent.
pub trait NodeStore: Send + Sync {
    /// Record a new node and return its ID.
    ///
    /// Fails with [`StoreError::InvalidParent`] when the parent is absent.
    fn create(&self, node: ContentNode) -> StoreResult<ContentId>;

    /// Read a node by ID.
    ///
    /// Returns `Ok(None)` if the node does not exist.
    fn get(&self, id: &ContentId) -> StoreResult<Option<ContentNode>>;

    /// Check whether a node exists.
    fn exists(&self, id: &ContentId) -> StoreResult<bool>;

    /// Delete a node and return it.
    ///
    /// Fails with [`StoreError::StillReferenced`] if any child still names
    /// this node as parent, and [`StoreError::NotFound`] if it is absent.
    fn delete(&self, id: &ContentId) -> StoreResult<ContentNode>;

    /// IDs of the nodes whose parent is `id`, sorted.
    fn children(&self, id: &ContentId) -> StoreResult<Vec<ContentId>>;

    /// Returns `true` if any node names `id` as parent.
    fn has_children(&self, id: &ContentId) -> StoreResult<bool>;

    /// All node IDs, sorted.
    fn all_ids(&self) -> StoreResult<Vec<ContentId>>;

    /// Read a node, failing with [`StoreError::NotFound`] if absent.
    fn require(&self, id: &ContentId) -> StoreResult<ContentNode> {
        self.get(id)?.ok_or(StoreError::NotFound(*id))
    }

    /// The parent chain of `id`, nearest parent first. `id` itself is not
    /// included.
    ///
    /// Walks iteratively, so deep layer chains cannot overflow the stack.
    fn ancestors(&self, id: &ContentId) -> StoreResult<Vec<ContentId>> {
        let mut chain = Vec::new();
        let mut current = self.require(id)?.parent;
        while let Some(parent) = current {
            if parent == *id || chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = self.get(&parent)?.and_then(|node| node.parent);
        }
        Ok(chain)
    }
}
