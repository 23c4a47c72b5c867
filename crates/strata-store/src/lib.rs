//! Content node storage for the strata image graph.
//!
//! Image content is a forest of immutable [`ContentNode`]s. Each node is
//! keyed by a caller-supplied [`ContentId`](strata_types::ContentId) and may
//! name one parent node it is layered on.
//!
//! # Storage Backends
//!
//! All backends implement the [`NodeStore`] trait:
//!
//! - [`InMemoryNodeStore`] -- `HashMap`-based store with a reverse child index
//!
//! # Design Rules
//!
//! 1. Nodes are immutable once created.
//! 2. A parent must exist before a child naming it can be created.
//! 3. A node with live children cannot be deleted.
//! 4. Deleting a node never deletes its parent; callers re-check the parent.
//! 5. The store decides node lifetime. Tags and consumers only observe it.

pub mod error;
pub mod memory;
pub mod node;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryNodeStore;
pub use node::ContentNode;
pub use traits::NodeStore;
