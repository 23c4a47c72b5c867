//! The [`TagStore`] trait defining the tag table interface.

use strata_types::ContentId;

use crate::error::Result;
use crate::names::TagName;
use crate::types::Tag;

/// Storage backend for tags.
///
/// Implementations must be thread-safe (`Send + Sync`). Every mutation of a
/// single name is atomic: no reader ever sees a name unresolved in the
/// middle of a move, or resolving to two targets.
pub trait TagStore: Send + Sync {
    /// Point `name` at `target`, creating the tag if needed.
    ///
    /// Returns the previous target, if the name already existed. The caller
    /// uses it to re-check whether that node lost its last reference.
    fn set(&self, name: &TagName, target: ContentId) -> Result<Option<ContentId>>;

    /// Resolve a name to its target.
    fn get(&self, name: &TagName) -> Result<Option<ContentId>>;

    /// Remove a name and return the target it pointed at.
    ///
    /// Returns `Ok(None)` if the name did not exist.
    fn remove(&self, name: &TagName) -> Result<Option<ContentId>>;

    /// Names currently pointing at `target`, sorted.
    fn tags_for(&self, target: &ContentId) -> Result<Vec<TagName>>;

    /// All tags, sorted by name.
    fn list(&self) -> Result<Vec<Tag>>;
}
