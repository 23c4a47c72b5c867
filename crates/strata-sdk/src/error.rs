use thiserror::Error;

use strata_gc::GcError;
use strata_refs::RefError;
use strata_store::StoreError;
use strata_tracker::TrackerError;
use strata_types::ContentId;

/// User-facing errors from [`ImageStore`](crate::ImageStore).
///
/// A removal that stops at a referenced ancestor is not an error and never
/// shows up here.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("No such image: {0}")]
    NotFound(String),

    #[error("invalid parent for {node}: {parent} does not exist")]
    InvalidParent { node: ContentId, parent: ContentId },

    #[error("invalid reference format: {0}")]
    InvalidReference(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ImageResult<T> = Result<T, ImageError>;

impl From<StoreError> for ImageError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => Self::NotFound(id.to_string()),
            StoreError::InvalidParent { node, parent } => Self::InvalidParent { node, parent },
            StoreError::SelfParent(id) => Self::InvalidParent {
                node: id,
                parent: id,
            },
            StoreError::Conflict(_) => Self::Conflict(e.to_string()),
            StoreError::StillReferenced { .. } | StoreError::LockPoisoned(_) => {
                Self::Internal(e.to_string())
            }
        }
    }
}

impl From<RefError> for ImageError {
    fn from(e: RefError) -> Self {
        match e {
            RefError::InvalidReference { name, reason } => {
                Self::InvalidReference(format!("{name}: {reason}"))
            }
            RefError::LockPoisoned(_) => Self::Internal(e.to_string()),
        }
    }
}

impl From<TrackerError> for ImageError {
    fn from(e: TrackerError) -> Self {
        match e {
            TrackerError::Store(e) => e.into(),
            TrackerError::LockPoisoned(_) => Self::Internal(e.to_string()),
        }
    }
}

impl From<GcError> for ImageError {
    fn from(e: GcError) -> Self {
        match e {
            GcError::NotFound(reference) => Self::NotFound(reference),
            GcError::Store(e) => e.into(),
            GcError::Ref(e) => e.into(),
            GcError::Tracker(e) => e.into(),
            GcError::StillReferenced { .. } | GcError::MultipleTags { .. } => {
                Self::Conflict(e.to_string())
            }
            GcError::LockPoisoned(_) => Self::Internal(e.to_string()),
        }
    }
}
