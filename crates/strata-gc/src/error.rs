use strata_refs::{RefError, TagName};
use strata_store::StoreError;
use strata_tracker::TrackerError;
use strata_types::ContentId;

use crate::retention::Retention;

/// Errors from removal and collection.
///
/// A sweep that reaches a referenced node is not an error: it stops there
/// and reports the node in [`RemovalReport::blocked`](crate::RemovalReport).
#[derive(Debug, thiserror::Error)]
pub enum GcError {
    /// The identifier resolved to no tag and no node.
    #[error("no such image: {0}")]
    NotFound(String),

    /// A direct delete of a node that is still referenced.
    #[error("unable to delete {id}: {reason}")]
    StillReferenced { id: ContentId, reason: Retention },

    /// Removal by ID of an image known by several names.
    #[error("unable to remove {id}: referenced by {} tags", .tags.len())]
    MultipleTags { id: ContentId, tags: Vec<TagName> },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("ref error: {0}")]
    Ref(#[from] RefError),

    #[error("tracker error: {0}")]
    Tracker(#[from] TrackerError),

    /// The graph gate was poisoned by a panicking holder.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result alias for removal operations.
pub type GcResult<T> = Result<T, GcError>;
