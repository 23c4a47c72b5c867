use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Algorithm prefix accepted in front of a hex digest.
pub const ALGORITHM_PREFIX: &str = "blake3:";

/// Length of a full hex-encoded [`ContentId`].
pub const HEX_LEN: usize = 64;

/// Content-addressed identifier for an image node.
///
/// A `ContentId` is a BLAKE3 digest. Identical content always produces the
/// same `ContentId`. The image graph never computes these itself; commit
/// providers hand them in (see [`ContentHasher`](crate::ContentHasher)).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId([u8; 32]);

impl ContentId {
    /// Compute a `ContentId` from raw bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Create a `ContentId` from a pre-computed digest.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 12 characters), as printed in listings.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..6])
    }

    /// Parse from a hex string, with or without the `blake3:` prefix.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let digest = match s.split_once(':') {
            Some(("blake3", rest)) => rest,
            Some((algo, _)) => return Err(TypeError::UnsupportedAlgorithm(algo.to_string())),
            None => s,
        };
        let bytes = hex::decode(digest).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Returns `true` if `s` has the shape of a full content ID.
    ///
    /// Used to decide whether a caller-supplied identifier is an ID or a name.
    pub fn is_id_like(s: &str) -> bool {
        let digest = s.strip_prefix(ALGORITHM_PREFIX).unwrap_or(s);
        digest.len() == HEX_LEN && digest.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.short_hex())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ContentId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for ContentId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<ContentId> for String {
    fn from(id: ContentId) -> Self {
        id.to_hex()
    }
}

impl From<[u8; 32]> for ContentId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<ContentId> for [u8; 32] {
    fn from(id: ContentId) -> Self {
        id.0
    }
}
