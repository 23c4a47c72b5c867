//! [`ImageRef`]: the identifier callers hand to inspect and remove.

use std::fmt;

use strata_types::ContentId;

use crate::error::{RefError, Result};
use crate::names::{TagName, DEFAULT_TAG};

/// A caller-supplied image identifier, either a name or a full content ID.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImageRef {
    /// A full content ID (bare hex or `blake3:` prefixed).
    Id(ContentId),
    /// A `repository[:tag]` name.
    Name(TagName),
}

impl ImageRef {
    /// Parse an identifier, defaulting the tag to [`DEFAULT_TAG`].
    pub fn parse(s: &str) -> Result<Self> {
        Self::parse_with_default(s, DEFAULT_TAG)
    }

    /// Parse an identifier, defaulting the tag to `default_tag`.
    ///
    /// Anything shaped like a 64-hex digest is an ID; everything else must
    /// be a valid name.
    pub fn parse_with_default(s: &str, default_tag: &str) -> Result<Self> {
        if ContentId::is_id_like(s) {
            let id = ContentId::from_hex(s).map_err(|e| RefError::InvalidReference {
                name: s.to_string(),
                reason: e.to_string(),
            })?;
            return Ok(Self::Id(id));
        }
        TagName::parse_with_default(s, default_tag).map(Self::Name)
    }

    /// The name, if this reference is one.
    pub fn as_name(&self) -> Option<&TagName> {
        match self {
            Self::Name(name) => Some(name),
            Self::Id(_) => None,
        }
    }

    /// The content ID, if this reference is one.
    pub fn as_id(&self) -> Option<&ContentId> {
        match self {
            Self::Id(id) => Some(id),
            Self::Name(_) => None,
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

impl From<ContentId> for ImageRef {
    fn from(id: ContentId) -> Self {
        Self::Id(id)
    }
}

impl From<TagName> for ImageRef {
    fn from(name: TagName) -> Self {
        Self::Name(name)
    }
}
