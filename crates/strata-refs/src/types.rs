//! The [`Tag`] record stored in the tag table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strata_types::ContentId;

use crate::names::TagName;

/// A mutable name bound to exactly one content node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Normalized `repository:tag` name.
    pub name: TagName,
    /// The node this tag currently names.
    pub target: ContentId,
    /// When the tag was last pointed at `target`.
    pub updated_at: DateTime<Utc>,
}

impl Tag {
    pub fn new(name: TagName, target: ContentId) -> Self {
        Self {
            name,
            target,
            updated_at: Utc::now(),
        }
    }
}
