//! Foundation types for the strata image graph.
//!
//! Every other strata crate depends on `strata-types`.
//!
//! # Key Types
//!
//! - [`ContentId`] -- Content-addressed node identifier (BLAKE3 digest)
//! - [`ContentHasher`] -- Domain-separated hasher used by commit providers
//! - [`ConsumerId`] -- Opaque handle for something built on top of a node

pub mod consumer;
pub mod content;
pub mod error;
pub mod hasher;

pub use consumer::ConsumerId;
pub use content::ContentId;
pub use error::TypeError;
pub use hasher::ContentHasher;
