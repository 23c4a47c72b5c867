//! In-memory tag table.
//!
//! [`InMemoryTagStore`] keeps the forward map and a reverse index from
//! target to names under one `RwLock`, so a move updates both at once.

use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use strata_types::ContentId;

use crate::error::{RefError, Result};
use crate::names::TagName;
use crate::traits::TagStore;
use crate::types::Tag;

/// An in-memory implementation of [`TagStore`].
#[derive(Debug, Default)]
pub struct InMemoryTagStore {
    inner: RwLock<TagState>,
}

#[derive(Debug, Default)]
struct TagState {
    tags: HashMap<TagName, Tag>,
    by_target: HashMap<ContentId, BTreeSet<TagName>>,
}

impl TagState {
    fn unindex(&mut self, name: &TagName, target: &ContentId) {
        if let Some(names) = self.by_target.get_mut(target) {
            names.remove(name);
            if names.is_empty() {
                self.by_target.remove(target);
            }
        }
    }
}

impl InMemoryTagStore {
    /// Create a new empty tag table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tags.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.tags.len())
    }

    /// Returns `true` if no tags exist.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.tags.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, TagState>> {
        self.inner
            .read()
            .map_err(|e| RefError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, TagState>> {
        self.inner
            .write()
            .map_err(|e| RefError::LockPoisoned(e.to_string()))
    }
}

impl TagStore for InMemoryTagStore {
    fn set(&self, name: &TagName, target: ContentId) -> Result<Option<ContentId>> {
        let mut state = self.write()?;
        let previous = state.tags.get(name).map(|t| t.target);

        if previous == Some(target) {
            return Ok(previous);
        }
        if let Some(old) = previous {
            state.unindex(name, &old);
        }
        state
            .by_target
            .entry(target)
            .or_default()
            .insert(name.clone());
        state.tags.insert(name.clone(), Tag::new(name.clone(), target));

        debug!(
            tag = %name,
            target = %target.short_hex(),
            previous = ?previous.map(|p| p.short_hex()),
            "tag set"
        );
        Ok(previous)
    }

    fn get(&self, name: &TagName) -> Result<Option<ContentId>> {
        Ok(self.read()?.tags.get(name).map(|t| t.target))
    }

    fn remove(&self, name: &TagName) -> Result<Option<ContentId>> {
        let mut state = self.write()?;
        let Some(tag) = state.tags.remove(name) else {
            return Ok(None);
        };
        state.unindex(name, &tag.target);
        debug!(tag = %name, target = %tag.target.short_hex(), "tag removed");
        Ok(Some(tag.target))
    }

    fn tags_for(&self, target: &ContentId) -> Result<Vec<TagName>> {
        let state = self.read()?;
        Ok(state
            .by_target
            .get(target)
            .map(|names| names.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn list(&self) -> Result<Vec<Tag>> {
        let state = self.read()?;
        let mut tags: Vec<Tag> = state.tags.values().cloned().collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }
}
