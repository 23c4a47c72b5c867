use strata_store::StoreError;

/// Errors from consumer tracking.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// The node store failed while answering a child query.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// An internal lock was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result alias for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;
