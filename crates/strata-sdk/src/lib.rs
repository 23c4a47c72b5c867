//! High-level image store for the strata image graph.
//!
//! [`ImageStore`] is the entry point for applications embedding strata. It
//! wires the node store, tag table, consumer tracker, and removal engine
//! together and keeps every multi-step operation consistent.

pub mod commit;
pub mod config;
pub mod error;
pub mod store;

pub use commit::{CommitOutcome, CommitRequest};
pub use config::StoreConfig;
pub use error::{ImageError, ImageResult};
pub use store::{ImageInspect, ImageStore, ImageSummary};

// Re-export key types
pub use strata_gc::{CancelFlag, RemovalEvent, RemovalReport, RemoveOptions, Retention};
pub use strata_refs::{ImageRef, TagName};
pub use strata_types::{ConsumerId, ContentHasher, ContentId};
