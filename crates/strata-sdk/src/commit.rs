use serde::{Deserialize, Serialize};

use strata_types::{ContentHasher, ContentId};

/// A new node handed in by the commit provider.
///
/// The provider computes `id`, either itself or through
/// [`CommitRequest::from_layer`]; the store only records it and, if `reference` is set, moves that tag.
#[derive(Clone, Debug)]
pub struct CommitRequest {
    pub id: ContentId,
    pub parent: Option<ContentId>,
    pub reference: Option<String>,
    pub comment: Option<String>,
    pub changes: Vec<String>,
}

impl CommitRequest {
    pub fn new(id: ContentId) -> Self {
        Self {
            id,
            parent: None,
            reference: None,
            comment: None,
            changes: Vec::new(),
        }
    }

    /// A request whose ID is derived from `layer` on top of `parent`.
    pub fn from_layer(parent: Option<ContentId>, layer: &[u8]) -> Self {
        let id = ContentHasher::NODE.derive_node(parent.as_ref(), layer);
        Self {
            parent,
            ..Self::new(id)
        }
    }

    pub fn with_parent(mut self, parent: ContentId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Tag the new node with `reference` once it is recorded.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_change(mut self, change: impl Into<String>) -> Self {
        self.changes.push(change.into());
        self
    }
}

/// Result of a commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitOutcome {
    pub id: ContentId,
    /// The node the tag pointed at before, if the commit moved it.
    pub replaced: Option<ContentId>,
    /// Nodes collected after the move (only with eager collection).
    pub collected: Vec<ContentId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder() {
        let base = ContentId::from_bytes(b"base");
        let id = ContentId::from_bytes(b"top");
        let req = CommitRequest::new(id)
            .with_parent(base)
            .with_reference("img")
            .with_comment("change 2")
            .with_change("ENTRYPOINT [\"true\"]");
        assert_eq!(req.parent, Some(base));
        assert_eq!(req.reference.as_deref(), Some("img"));
        assert_eq!(req.comment.as_deref(), Some("change 2"));
        assert_eq!(req.changes, vec!["ENTRYPOINT [\"true\"]"]);
    }

    #[test]
    fn layer_request_derives_id_from_parent() {
        let root = CommitRequest::from_layer(None, b"busybox");
        assert!(root.parent.is_none());

        let child = CommitRequest::from_layer(Some(root.id), b"change 1");
        assert_eq!(child.parent, Some(root.id));
        assert_ne!(child.id, CommitRequest::from_layer(None, b"change 1").id);
        assert_eq!(child.id, CommitRequest::from_layer(Some(root.id), b"change 1").id);
    }

    #[test]
    fn bare_request() {
        let req = CommitRequest::new(ContentId::from_bytes(b"root"));
        assert!(req.parent.is_none());
        assert!(req.reference.is_none());
        assert!(req.changes.is_empty());
    }
}
