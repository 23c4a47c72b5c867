//! [`StoreConfig`]: tunables for an [`ImageStore`](crate::ImageStore).
//!
//! ```toml
//! default_tag = "latest"
//! eager_collect = false
//! prune_parents = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use strata_refs::{TagName, DEFAULT_TAG};

use crate::error::{ImageError, ImageResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Tag applied to names given without one.
    pub default_tag: String,
    /// Sweep the previous target after a tag moves or a consumer is
    /// released. When off, such nodes are left dangling until removed.
    pub eager_collect: bool,
    /// Default for [`RemoveOptions::prune_parents`](strata_gc::RemoveOptions).
    pub prune_parents: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_tag: DEFAULT_TAG.to_string(),
            eager_collect: false,
            prune_parents: true,
        }
    }
}

impl StoreConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> ImageResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| ImageError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> ImageResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ImageError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> ImageResult<String> {
        toml::to_string(self).map_err(|e| ImageError::Config(e.to_string()))
    }

    fn validate(&self) -> ImageResult<()> {
        TagName::parse_with_default("image", &self.default_tag).map_err(|_| {
            ImageError::Config(format!("invalid default_tag: {:?}", self.default_tag))
        })?;
        Ok(())
    }
}
