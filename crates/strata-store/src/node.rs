//! The [`ContentNode`] type: one immutable unit of image content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use strata_types::ContentId;

/// A node in the image content graph.
///
/// Nodes are immutable once created. The optional `parent` forms a forest:
/// each node has at most one parent, a parent may have many children.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentNode {
    /// Content-derived identifier, supplied by the commit provider.
    pub id: ContentId,
    /// The node this one is layered on, if any.
    pub parent: Option<ContentId>,
    /// When the node was recorded.
    pub created_at: DateTime<Utc>,
    /// Free-form commit message.
    pub comment: Option<String>,
    /// Config instructions applied by the commit (e.g. `ENTRYPOINT ["true"]`).
    pub changes: Vec<String>,
}

impl ContentNode {
    /// A root node with no parent.
    pub fn root(id: ContentId) -> Self {
        Self::new(id, None)
    }

    /// A node layered on `parent`.
    pub fn child(id: ContentId, parent: ContentId) -> Self {
        Self::new(id, Some(parent))
    }

    pub fn new(id: ContentId, parent: Option<ContentId>) -> Self {
        Self {
            id,
            parent,
            created_at: Utc::now(),
            comment: None,
            changes: Vec::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_changes<I, S>(mut self, changes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.changes.extend(changes.into_iter().map(Into::into));
        self
    }

    /// Returns `true` if this node has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
