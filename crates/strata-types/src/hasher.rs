use crate::content::ContentId;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so its IDs never collide with a plain digest of the same
/// bytes. Commit providers use this to derive node IDs; the stores
/// only ever accept IDs they are given.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for image nodes (parent link + layer bytes).
    pub const NODE: Self = Self {
        domain: "strata-node-v1",
    };

    /// Derive the ID of a node built from `parent` plus `layer`.
    ///
    /// A root node and a child of some parent never collide, even for the
    /// same layer bytes.
    pub fn derive_node(&self, parent: Option<&ContentId>, layer: &[u8]) -> ContentId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        match parent {
            Some(parent) => {
                hasher.update(b"parent:");
                hasher.update(parent.as_bytes());
            }
            None => {
                hasher.update(b"root");
            }
        }
        hasher.update(b":");
        hasher.update(layer);
        ContentId::from_hash(*hasher.finalize().as_bytes())
    }
}
