//! Removal and orphan collection for the strata image graph.
//!
//! A content node is *referenced* while a tag names it, a consumer depends
//! on it, or a child node is layered on it. [`RemovalEngine`] untags a name
//! and then walks upward from the untagged node, deleting each node that lost
//! its last reference and stopping at the first one still referenced.
//!
//! Collection is local: only the parent chain of the node whose reference
//! changed is visited, never the whole graph.

pub mod engine;
pub mod error;
pub mod report;
pub mod retention;

pub use engine::{GraphGuard, GraphSnapshot, GraphView, RemovalEngine};
pub use error::{GcError, GcResult};
pub use report::{CancelFlag, RemovalEvent, RemovalReport, RemoveOptions, SweepOutcome};
pub use retention::Retention;
