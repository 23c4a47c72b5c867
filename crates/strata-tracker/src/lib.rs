//! Consumer reference tracking for the strata image graph.
//!
//! A consumer is anything built on top of an image node that the graph does
//! not own: in a container engine, a created or stopped container. The
//! execution subsystem declares consumers through [`ReferenceTracker`]; the
//! removal engine asks it whether a node still has any.
//!
//! The tracker is pure set bookkeeping. It never deletes nodes.

pub mod error;
pub mod tracker;

pub use error::{TrackerError, TrackerResult};
pub use tracker::ReferenceTracker;
