use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Opaque handle for something that depends on an image node.
///
/// In a container engine this is usually a container ID. The graph never
/// interprets the value; it only compares handles for equality.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConsumerId(String);

impl ConsumerId {
    /// Wrap an externally allocated handle.
    pub fn new(handle: impl Into<String>) -> Result<Self, TypeError> {
        let handle = handle.into();
        if handle.is_empty() {
            return Err(TypeError::EmptyConsumer);
        }
        Ok(Self(handle))
    }

    /// Mint a fresh time-ordered handle (UUID v7).
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// The handle as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short representation (first 12 characters).
    pub fn short_id(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(12)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Debug for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConsumerId({})", self.short_id())
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ConsumerId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ConsumerId> for String {
    fn from(id: ConsumerId) -> Self {
        id.0
    }
}
