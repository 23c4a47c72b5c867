//! Tag management for the strata image graph.
//!
//! Tags are the human-readable entry points into the content graph,
//! analogous to `repository:tag` names in a container engine.
//!
//! # Architecture
//!
//! - A **tag** maps one [`TagName`] to exactly one content ID. Setting an
//!   existing tag moves it atomically and hands back the previous target,
//!   so the caller can re-check whether that node is now unreferenced.
//! - An **image reference** ([`ImageRef`]) is what callers type: either a
//!   full content ID or a name. It is normalized before touching the table.
//!
//! # Modules
//!
//! - [`error`] -- Error types for tag operations
//! - [`names`] -- Reference name parsing and validation
//! - [`reference`] -- [`ImageRef`], the name-or-ID identifier
//! - [`types`] -- The [`Tag`] record
//! - [`traits`] -- The [`TagStore`] trait defining the storage interface
//! - [`memory`] -- In-memory [`InMemoryTagStore`]

pub mod error;
pub mod memory;
pub mod names;
pub mod reference;
pub mod traits;
pub mod types;

pub use error::{RefError, Result};
pub use memory::InMemoryTagStore;
pub use names::{TagName, DEFAULT_TAG};
pub use reference::ImageRef;
pub use traits::TagStore;
pub use types::Tag;
