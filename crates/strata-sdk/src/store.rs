use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use strata_gc::{GraphGuard, RemovalEngine, RemovalReport, RemoveOptions};
use strata_refs::{ImageRef, InMemoryTagStore, TagName, TagStore};
use strata_store::{ContentNode, InMemoryNodeStore, NodeStore};
use strata_tracker::ReferenceTracker;
use strata_types::{ConsumerId, ContentId};

use crate::commit::{CommitOutcome, CommitRequest};
use crate::config::StoreConfig;
use crate::error::{ImageError, ImageResult};

/// Everything known about one image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInspect {
    pub id: ContentId,
    pub parent: Option<ContentId>,
    pub tags: Vec<TagName>,
    pub consumers: Vec<ConsumerId>,
    pub created_at: DateTime<Utc>,
    pub comment: Option<String>,
    pub changes: Vec<String>,
}

impl ImageInspect {
    /// Pretty-printed JSON, as an inspect endpoint would return it.
    pub fn to_json(&self) -> ImageResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ImageError::Internal(e.to_string()))
    }
}

/// One row of [`ImageStore::list`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub id: ContentId,
    pub parent: Option<ContentId>,
    pub tags: Vec<TagName>,
    pub consumers: usize,
    /// Untagged and not a parent of any other node.
    pub dangling: bool,
}

/// High-level image store API.
///
/// Every operation that adds a reference runs under the engine's
/// [`GraphGuard`], so it cannot interleave with a removal's
/// check-then-delete. Reads run under a snapshot and see one consistent
/// graph.
pub struct ImageStore {
    config: StoreConfig,
    engine: RemovalEngine,
}

impl ImageStore {
    /// An in-memory store with default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self::with_backends(
            config,
            Arc::new(InMemoryNodeStore::new()),
            Arc::new(InMemoryTagStore::new()),
        )
    }

    /// Build a store over caller-supplied backends. The store becomes
    /// their only writer.
    pub fn with_backends(
        config: StoreConfig,
        nodes: Arc<dyn NodeStore>,
        tags: Arc<dyn TagStore>,
    ) -> Self {
        let tracker = Arc::new(ReferenceTracker::new(nodes.clone()));
        Self {
            config,
            engine: RemovalEngine::new(nodes, tags, tracker),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn engine(&self) -> &RemovalEngine {
        &self.engine
    }

    /// Parse a name or ID, applying the configured default tag.
    pub fn parse_reference(&self, reference: &str) -> ImageResult<ImageRef> {
        Ok(ImageRef::parse_with_default(
            reference,
            &self.config.default_tag,
        )?)
    }

    /// Options `remove` uses when the caller passes none.
    pub fn remove_options(&self) -> RemoveOptions {
        RemoveOptions {
            prune_parents: self.config.prune_parents,
            cancel: None,
        }
    }

    // ---- Commit and tag ----

    /// Record a new node and, if requested, move a tag onto it.
    pub fn commit(&self, request: CommitRequest) -> ImageResult<CommitOutcome> {
        let name = request
            .reference
            .as_deref()
            .map(|r| self.parse_name(r))
            .transpose()?;

        let mut node = ContentNode::new(request.id, request.parent).with_changes(request.changes);
        if let Some(comment) = request.comment {
            node = node.with_comment(comment);
        }

        let graph = self.engine.exclusive()?;
        let id = graph.create(node)?;

        let replaced = match &name {
            Some(name) => move_tag(&graph, name, id)?,
            None => None,
        };
        let collected = match replaced {
            Some(previous) => self.collect_orphan(&graph, previous)?,
            None => Vec::new(),
        };

        info!(
            node = %id.short_hex(),
            reference = ?name.as_ref().map(ToString::to_string),
            collected = collected.len(),
            "image committed"
        );
        Ok(CommitOutcome {
            id,
            replaced,
            collected,
        })
    }

    /// Point `reference` at the image `target` names.
    ///
    /// Returns the node the tag pointed at before, if it moved.
    pub fn tag(&self, reference: &str, target: &str) -> ImageResult<Option<ContentId>> {
        let name = self.parse_name(reference)?;
        let target = self.parse_reference(target)?;

        let graph = self.engine.exclusive()?;
        let id = graph.resolve(&target)?;
        let replaced = move_tag(&graph, &name, id)?;
        if let Some(previous) = replaced {
            self.collect_orphan(&graph, previous)?;
        }
        Ok(replaced)
    }

    fn parse_name(&self, reference: &str) -> ImageResult<TagName> {
        Ok(TagName::parse_with_default(
            reference,
            &self.config.default_tag,
        )?)
    }

    /// Sweep from `id` after it lost a reference, if eager collection is on.
    fn collect_orphan(&self, graph: &GraphGuard<'_>, id: ContentId) -> ImageResult<Vec<ContentId>> {
        if !self.config.eager_collect {
            debug!(node = %id.short_hex(), "reference dropped; leaving node for explicit removal");
            return Ok(Vec::new());
        }
        let mut report = RemovalReport::default();
        graph.sweep(id, &self.remove_options(), &mut report)?;
        Ok(report.deleted)
    }

    // ---- Queries ----

    pub fn inspect(&self, reference: &str) -> ImageResult<ImageInspect> {
        let reference = self.parse_reference(reference)?;
        let graph = self.engine.shared()?;

        let id = graph.resolve(&reference)?;
        let node = graph
            .node(&id)?
            .ok_or_else(|| ImageError::NotFound(reference.to_string()))?;

        Ok(ImageInspect {
            id,
            parent: node.parent,
            tags: graph.tags_for(&id)?,
            consumers: graph.consumers(&id)?,
            created_at: node.created_at,
            comment: node.comment,
            changes: node.changes,
        })
    }

    /// The image and its ancestors, nearest first.
    pub fn history(&self, reference: &str) -> ImageResult<Vec<ContentId>> {
        let reference = self.parse_reference(reference)?;
        let graph = self.engine.shared()?;

        let id = graph.resolve(&reference)?;
        let mut chain = vec![id];
        chain.extend(graph.ancestors(&id)?);
        Ok(chain)
    }

    /// Every image in the store, sorted by ID.
    pub fn list(&self) -> ImageResult<Vec<ImageSummary>> {
        let graph = self.engine.shared()?;

        let mut images = Vec::new();
        for id in graph.all_ids()? {
            let Some(node) = graph.node(&id)? else {
                continue;
            };
            let tags = graph.tags_for(&id)?;
            let dangling = tags.is_empty() && !graph.has_children(&id)?;
            images.push(ImageSummary {
                id,
                parent: node.parent,
                tags,
                consumers: graph.consumer_count(&id)?,
                dangling,
            });
        }
        Ok(images)
    }

    // ---- Consumers ----

    /// Register `consumer` as depending on the image `reference` names.
    pub fn add_consumer(&self, reference: &str, consumer: ConsumerId) -> ImageResult<ContentId> {
        let reference = self.parse_reference(reference)?;
        let graph = self.engine.exclusive()?;

        let id = graph.resolve(&reference)?;
        graph.add_consumer(id, consumer)?;
        Ok(id)
    }

    /// Withdraw `consumer`'s dependency on `id`. Releasing an unknown
    /// handle is a no-op.
    ///
    /// Returns the nodes collected as a result (only with eager collection).
    pub fn release_consumer(
        &self,
        id: &ContentId,
        consumer: &ConsumerId,
    ) -> ImageResult<Vec<ContentId>> {
        let graph = self.engine.exclusive()?;
        if !graph.remove_consumer(id, consumer)? || graph.has_consumers(id)? {
            return Ok(Vec::new());
        }
        self.collect_orphan(&graph, *id)
    }

    // ---- Removal ----

    /// Untag a name, or a bare ID with at most one tag, and collect
    /// whatever that orphans.
    pub fn remove(&self, reference: &str) -> ImageResult<RemovalReport> {
        self.remove_with(reference, &self.remove_options())
    }

    pub fn remove_with(
        &self,
        reference: &str,
        options: &RemoveOptions,
    ) -> ImageResult<RemovalReport> {
        let reference = self.parse_reference(reference)?;
        Ok(self.engine.remove(&reference, options)?)
    }
}

fn move_tag(
    graph: &GraphGuard<'_>,
    name: &TagName,
    id: ContentId,
) -> ImageResult<Option<ContentId>> {
    let previous = graph.set_tag(name, id)?;
    Ok(previous.filter(|p| *p != id))
}

impl Default for ImageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ImageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageStore")
            .field("config", &self.config)
            .field("engine", &self.engine)
            .finish()
    }
}
