use strata_types::ContentId;

/// Errors from content node store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested node was not found.
    #[error("node not found: {0}")]
    NotFound(ContentId),

    /// A node named a parent that is not in the store.
    #[error("invalid parent for {node}: {parent} does not exist")]
    InvalidParent {
        /// The node being created.
        node: ContentId,
        /// The missing parent.
        parent: ContentId,
    },

    /// A node with this ID already exists with a different parent.
    #[error("node {0} already exists with a different parent")]
    Conflict(ContentId),

    /// The node still has children layered on it.
    #[error("node {id} is still referenced by {children} child node(s)")]
    StillReferenced {
        /// The node that could not be deleted.
        id: ContentId,
        /// Number of live children.
        children: usize,
    },

    /// A node named itself as parent.
    #[error("node {0} cannot be its own parent")]
    SelfParent(ContentId),

    /// An internal lock was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
