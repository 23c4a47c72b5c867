//! The [`RemovalEngine`]: untag, then sweep upward.
//!
//! A removal request moves through these phases:
//!
//! 1. **Resolving** -- the caller's name or ID becomes a content ID, or the
//!    request fails with [`GcError::NotFound`].
//! 2. **Untagging** -- a name is removed from the tag table. A bare ID
//!    untags the image's only name, if it has exactly one.
//! 3. **Collecting** -- starting at the resolved node, each node with no
//!    tag, no consumer, and no child is deleted and its parent becomes the
//!    next candidate.
//! 4. **Done / Blocked** -- the walk ends at the root, or at the first node
//!    still referenced. Both are successful outcomes.
//!
//! # Atomicity
//!
//! The engine owns the graph gate and the backends behind it. Every
//! mutation goes through a [`GraphGuard`], which holds the gate exclusively
//! for its lifetime; every read goes through a [`GraphSnapshot`], which
//! holds it shared. Between "observed unreferenced" and "deleted" nothing
//! can therefore re-reference the node.

use std::collections::HashSet;
use std::ops::Deref;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use strata_refs::{ImageRef, Tag, TagName, TagStore};
use strata_store::{ContentNode, NodeStore, StoreError};
use strata_tracker::ReferenceTracker;
use strata_types::{ConsumerId, ContentId};

use crate::error::{GcError, GcResult};
use crate::report::{RemovalReport, RemoveOptions};
use crate::retention::Retention;

/// Orchestrates untagging and dependency-aware deletion.
pub struct RemovalEngine {
    nodes: Arc<dyn NodeStore>,
    tags: Arc<dyn TagStore>,
    tracker: Arc<ReferenceTracker>,
    gate: RwLock<()>,
}

impl RemovalEngine {
    /// Take ownership of the graph backends.
    ///
    /// From here on the engine is the only writer: mutating a backend
    /// through another handle bypasses the gate.
    pub fn new(
        nodes: Arc<dyn NodeStore>,
        tags: Arc<dyn TagStore>,
        tracker: Arc<ReferenceTracker>,
    ) -> Self {
        Self {
            nodes,
            tags,
            tracker,
            gate: RwLock::new(()),
        }
    }

    /// Take the graph gate exclusively.
    pub fn exclusive(&self) -> GcResult<GraphGuard<'_>> {
        let gate = self
            .gate
            .write()
            .map_err(|e| GcError::LockPoisoned(e.to_string()))?;
        Ok(GraphGuard {
            view: GraphView { engine: self },
            _gate: gate,
        })
    }

    /// Take the graph gate shared, for reads that must see one snapshot
    /// across the tag table, the consumer sets, and the node store.
    pub fn shared(&self) -> GcResult<GraphSnapshot<'_>> {
        let gate = self
            .gate
            .read()
            .map_err(|e| GcError::LockPoisoned(e.to_string()))?;
        Ok(GraphSnapshot {
            view: GraphView { engine: self },
            _gate: gate,
        })
    }

    /// Remove a name or ID and collect whatever that orphans.
    ///
    /// Stopping at a referenced ancestor is a normal outcome, reported in
    /// [`RemovalReport::blocked`].
    pub fn remove(
        &self,
        reference: &ImageRef,
        options: &RemoveOptions,
    ) -> GcResult<RemovalReport> {
        self.exclusive()?.remove(reference, options)
    }
}

impl std::fmt::Debug for RemovalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemovalEngine")
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}

/// Read-only queries over one engine's graph.
///
/// Only reachable through a [`GraphGuard`] or a [`GraphSnapshot`], so the
/// gate is always held while it is in use.
#[derive(Clone, Copy)]
pub struct GraphView<'a> {
    engine: &'a RemovalEngine,
}

impl GraphView<'_> {
    /// Resolve a name or ID to the ID of an existing node.
    pub fn resolve(&self, reference: &ImageRef) -> GcResult<ContentId> {
        let id = match reference {
            ImageRef::Name(name) => self.engine.tags.get(name)?,
            ImageRef::Id(id) => Some(*id),
        };
        match id {
            Some(id) if self.engine.nodes.exists(&id)? => Ok(id),
            _ => Err(GcError::NotFound(reference.to_string())),
        }
    }

    pub fn node(&self, id: &ContentId) -> GcResult<Option<ContentNode>> {
        Ok(self.engine.nodes.get(id)?)
    }

    pub fn exists(&self, id: &ContentId) -> GcResult<bool> {
        Ok(self.engine.nodes.exists(id)?)
    }

    /// Every node ID, sorted.
    pub fn all_ids(&self) -> GcResult<Vec<ContentId>> {
        Ok(self.engine.nodes.all_ids()?)
    }

    /// Parent chain of `id`, nearest first.
    pub fn ancestors(&self, id: &ContentId) -> GcResult<Vec<ContentId>> {
        Ok(self.engine.nodes.ancestors(id)?)
    }

    pub fn has_children(&self, id: &ContentId) -> GcResult<bool> {
        Ok(self.engine.tracker.has_child(id)?)
    }

    /// Names pointing at `id`, sorted.
    pub fn tags_for(&self, id: &ContentId) -> GcResult<Vec<TagName>> {
        Ok(self.engine.tags.tags_for(id)?)
    }

    /// All tags, sorted by name.
    pub fn tags(&self) -> GcResult<Vec<Tag>> {
        Ok(self.engine.tags.list()?)
    }

    /// Consumers of `id`, sorted.
    pub fn consumers(&self, id: &ContentId) -> GcResult<Vec<ConsumerId>> {
        Ok(self.engine.tracker.consumers(id)?)
    }

    pub fn consumer_count(&self, id: &ContentId) -> GcResult<usize> {
        Ok(self.engine.tracker.consumer_count(id)?)
    }

    pub fn has_consumers(&self, id: &ContentId) -> GcResult<bool> {
        Ok(self.engine.tracker.has_consumers(id)?)
    }

    /// Every node with at least one consumer, sorted.
    pub fn consumed(&self) -> GcResult<Vec<ContentId>> {
        Ok(self.engine.tracker.consumed()?)
    }

    /// The first reason `id` must be kept, or `None` if it is unreferenced.
    pub fn retention(&self, id: &ContentId) -> GcResult<Option<Retention>> {
        let names = self.tags_for(id)?;
        if !names.is_empty() {
            return Ok(Some(Retention::Tagged(names)));
        }
        let consumers = self.consumers(id)?;
        if !consumers.is_empty() {
            return Ok(Some(Retention::Consumed(consumers)));
        }
        if self.has_children(id)? {
            return Ok(Some(Retention::Parent(self.engine.nodes.children(id)?)));
        }
        Ok(None)
    }
}

/// Shared hold on the graph gate.
pub struct GraphSnapshot<'a> {
    view: GraphView<'a>,
    _gate: RwLockReadGuard<'a, ()>,
}

impl<'a> Deref for GraphSnapshot<'a> {
    type Target = GraphView<'a>;

    fn deref(&self) -> &GraphView<'a> {
        &self.view
    }
}

/// Exclusive hold on the graph gate, and the only way to mutate the graph.
///
/// A guard is bound to the engine it came from; everything done through it
/// happens under that engine's gate.
pub struct GraphGuard<'a> {
    view: GraphView<'a>,
    _gate: RwLockWriteGuard<'a, ()>,
}

impl<'a> Deref for GraphGuard<'a> {
    type Target = GraphView<'a>;

    fn deref(&self) -> &GraphView<'a> {
        &self.view
    }
}

enum Deletion {
    Missing,
    Retained(Retention),
    Deleted(ContentNode),
}

impl GraphGuard<'_> {
    /// Record a node. Its parent, if any, must already exist.
    pub fn create(&self, node: ContentNode) -> GcResult<ContentId> {
        Ok(self.view.engine.nodes.create(node)?)
    }

    /// Point `name` at the existing node `target`.
    ///
    /// Returns the previous target, which may now be unreferenced.
    pub fn set_tag(&self, name: &TagName, target: ContentId) -> GcResult<Option<ContentId>> {
        if !self.exists(&target)? {
            return Err(GcError::NotFound(target.to_string()));
        }
        Ok(self.view.engine.tags.set(name, target)?)
    }

    /// Register `consumer` on the existing node `id`.
    pub fn add_consumer(&self, id: ContentId, consumer: ConsumerId) -> GcResult<bool> {
        if !self.exists(&id)? {
            return Err(GcError::NotFound(id.to_string()));
        }
        Ok(self.view.engine.tracker.add_consumer(id, consumer)?)
    }

    pub fn remove_consumer(&self, id: &ContentId, consumer: &ConsumerId) -> GcResult<bool> {
        Ok(self.view.engine.tracker.remove_consumer(id, consumer)?)
    }

    /// Delete a single unreferenced node.
    ///
    /// Fails with [`GcError::StillReferenced`] if a tag, a consumer, or a
    /// child still holds it. Never touches the parent.
    pub fn delete(&self, id: &ContentId) -> GcResult<ContentNode> {
        match self.try_delete(id)? {
            Deletion::Deleted(node) => Ok(node),
            Deletion::Retained(reason) => Err(GcError::StillReferenced { id: *id, reason }),
            Deletion::Missing => Err(GcError::NotFound(id.to_string())),
        }
    }

    fn try_delete(&self, id: &ContentId) -> GcResult<Deletion> {
        if !self.exists(id)? {
            return Ok(Deletion::Missing);
        }
        if let Some(reason) = self.retention(id)? {
            return Ok(Deletion::Retained(reason));
        }
        let nodes = &self.view.engine.nodes;
        match nodes.delete(id) {
            Ok(node) => Ok(Deletion::Deleted(node)),
            Err(StoreError::StillReferenced { .. }) => {
                Ok(Deletion::Retained(Retention::Parent(nodes.children(id)?)))
            }
            Err(StoreError::NotFound(_)) => Ok(Deletion::Missing),
            Err(e) => Err(e.into()),
        }
    }

    /// Untag and collect; see [`RemovalEngine::remove`].
    pub fn remove(
        &self,
        reference: &ImageRef,
        options: &RemoveOptions,
    ) -> GcResult<RemovalReport> {
        let target = self.resolve(reference)?;
        let mut report = RemovalReport::default();

        let untag = match reference {
            ImageRef::Name(name) => Some(name.clone()),
            ImageRef::Id(id) => {
                let mut names = self.tags_for(id)?;
                if names.len() > 1 {
                    return Err(GcError::MultipleTags {
                        id: *id,
                        tags: names,
                    });
                }
                names.pop()
            }
        };

        // Untagging is unconditional; consumers only block deletion.
        if let Some(name) = untag {
            if self.view.engine.tags.remove(&name)?.is_none() {
                return Err(GcError::NotFound(reference.to_string()));
            }
            report.untagged = Some(name);
        }

        self.sweep(target, options, &mut report)?;

        info!(
            reference = %reference,
            deleted = report.deleted.len(),
            outcome = ?report.outcome(),
            "image removed"
        );
        Ok(report)
    }

    /// Delete `start` and then each parent in turn while they are
    /// unreferenced. Nothing is untagged, so this is also the collect step
    /// after a tag moves away from `start` or its last consumer goes away.
    ///
    /// The walk is a loop over the parent chain, bounded by its depth. It
    /// stops at the first referenced node, at a node that is already gone,
    /// on cancellation, or after one step when pruning is disabled.
    pub fn sweep(
        &self,
        start: ContentId,
        options: &RemoveOptions,
        report: &mut RemovalReport,
    ) -> GcResult<()> {
        let mut visited = HashSet::new();
        let mut candidate = Some(start);

        while let Some(id) = candidate.take() {
            if options.is_cancelled() {
                warn!(node = %id.short_hex(), deleted = report.deleted.len(), "sweep cancelled");
                report.cancelled = true;
                break;
            }
            if !visited.insert(id) {
                warn!(node = %id.short_hex(), "parent chain revisits node; stopping sweep");
                break;
            }

            match self.try_delete(&id)? {
                Deletion::Missing => break,
                Deletion::Retained(reason) => {
                    debug!(node = %id.short_hex(), %reason, "sweep blocked");
                    report.blocked = Some((id, reason));
                    break;
                }
                Deletion::Deleted(node) => {
                    report.deleted.push(id);
                    if options.prune_parents {
                        candidate = node.parent;
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{CancelFlag, SweepOutcome};
    use strata_refs::InMemoryTagStore;
    use strata_store::InMemoryNodeStore;

    struct Fixture {
        nodes: Arc<InMemoryNodeStore>,
        tags: Arc<InMemoryTagStore>,
        tracker: Arc<ReferenceTracker>,
        engine: RemovalEngine,
    }

    fn fixture() -> Fixture {
        let nodes = Arc::new(InMemoryNodeStore::new());
        let tags = Arc::new(InMemoryTagStore::new());
        let tracker = Arc::new(ReferenceTracker::new(nodes.clone()));
        let engine = RemovalEngine::new(nodes.clone(), tags.clone(), tracker.clone());
        Fixture {
            nodes,
            tags,
            tracker,
            engine,
        }
    }

    fn cid(s: &str) -> ContentId {
        ContentId::from_bytes(s.as_bytes())
    }

    fn name(s: &str) -> TagName {
        TagName::parse(s).unwrap()
    }

    fn by_name(s: &str) -> ImageRef {
        ImageRef::Name(name(s))
    }

    fn consumer(s: &str) -> ConsumerId {
        ConsumerId::new(s).unwrap()
    }

    impl Fixture {
        /// A (root) <- B <- C.
        fn chain(&self) -> (ContentId, ContentId, ContentId) {
            let a = self.nodes.create(ContentNode::root(cid("a"))).unwrap();
            let b = self.nodes.create(ContentNode::child(cid("b"), a)).unwrap();
            let c = self.nodes.create(ContentNode::child(cid("c"), b)).unwrap();
            (a, b, c)
        }

        fn present(&self, id: &ContentId) -> bool {
            self.nodes.exists(id).unwrap()
        }
    }

    // ---------------------------------------------------------------
    // Upward sweep
    // ---------------------------------------------------------------

    #[test]
    fn sweep_stops_at_consumed_root() {
        let f = fixture();
        let (a, b, c) = f.chain();
        f.tags.set(&name("t"), c).unwrap();
        f.tracker.add_consumer(a, consumer("ctr-a")).unwrap();

        let report = f.engine.remove(&by_name("t"), &RemoveOptions::default()).unwrap();

        assert_eq!(report.untagged, Some(name("t")));
        assert_eq!(report.deleted, vec![c, b]);
        assert_eq!(
            report.blocked,
            Some((a, Retention::Consumed(vec![consumer("ctr-a")])))
        );
        assert_eq!(report.outcome(), SweepOutcome::Blocked);
        assert!(f.present(&a));
        assert!(!f.present(&b));
        assert!(!f.present(&c));
    }

    #[test]
    fn sweep_reclaims_whole_unreferenced_chain() {
        let f = fixture();
        let (a, b, c) = f.chain();
        f.tags.set(&name("t"), c).unwrap();

        let report = f.engine.remove(&by_name("t"), &RemoveOptions::default()).unwrap();
        assert_eq!(report.deleted, vec![c, b, a]);
        assert_eq!(report.outcome(), SweepOutcome::Done);
        assert!(f.nodes.is_empty().unwrap());
    }

    #[test]
    fn sweep_stops_at_tagged_ancestor() {
        let f = fixture();
        let (a, b, c) = f.chain();
        f.tags.set(&name("top"), c).unwrap();
        f.tags.set(&name("base"), a).unwrap();

        let report = f.engine.remove(&by_name("top"), &RemoveOptions::default()).unwrap();
        assert_eq!(report.deleted, vec![c, b]);
        assert_eq!(report.blocked, Some((a, Retention::Tagged(vec![name("base")]))));
    }

    #[test]
    fn sibling_keeps_shared_parent() {
        let f = fixture();
        let base = f.nodes.create(ContentNode::root(cid("base"))).unwrap();
        let x = f.nodes.create(ContentNode::child(cid("x"), base)).unwrap();
        let y = f.nodes.create(ContentNode::child(cid("y"), base)).unwrap();
        f.tags.set(&name("x"), x).unwrap();
        f.tags.set(&name("y"), y).unwrap();

        let report = f.engine.remove(&by_name("x"), &RemoveOptions::default()).unwrap();
        assert_eq!(report.deleted, vec![x]);
        assert_eq!(report.blocked, Some((base, Retention::Parent(vec![y]))));
        assert!(f.present(&base));
        assert!(f.present(&y));
    }

    #[test]
    fn target_with_children_is_only_untagged() {
        let f = fixture();
        let (_, b, c) = f.chain();
        f.tags.set(&name("mid"), b).unwrap();
        f.tags.set(&name("top"), c).unwrap();

        let report = f.engine.remove(&by_name("mid"), &RemoveOptions::default()).unwrap();
        assert_eq!(report.untagged, Some(name("mid")));
        assert!(report.deleted.is_empty());
        assert_eq!(report.blocked, Some((b, Retention::Parent(vec![c]))));
    }

    // ---------------------------------------------------------------
    // Untagging rules
    // ---------------------------------------------------------------

    #[test]
    fn untag_happens_even_when_consumed() {
        let f = fixture();
        let (_, _, c) = f.chain();
        f.tags.set(&name("t"), c).unwrap();
        f.tracker.add_consumer(c, consumer("ctr")).unwrap();

        let report = f.engine.remove(&by_name("t"), &RemoveOptions::default()).unwrap();
        assert_eq!(report.untagged, Some(name("t")));
        assert!(report.deleted.is_empty());
        assert!(f.tags.get(&name("t")).unwrap().is_none());
        assert!(f.present(&c));
    }

    #[test]
    fn removing_a_name_twice() {
        let f = fixture();
        let (_, _, c) = f.chain();
        f.tags.set(&name("t"), c).unwrap();

        assert!(f.engine.remove(&by_name("t"), &RemoveOptions::default()).is_ok());
        let err = f
            .engine
            .remove(&by_name("t"), &RemoveOptions::default())
            .unwrap_err();
        assert!(matches!(err, GcError::NotFound(ref r) if r == "t:latest"));
    }

    #[test]
    fn remove_by_untagged_id() {
        let f = fixture();
        let (a, b, c) = f.chain();
        let report = f
            .engine
            .remove(&ImageRef::Id(c), &RemoveOptions::default())
            .unwrap();
        assert!(report.untagged.is_none());
        assert_eq!(report.deleted, vec![c, b, a]);
    }

    #[test]
    fn remove_by_id_untags_single_name() {
        let f = fixture();
        let (a, b, c) = f.chain();
        f.tags.set(&name("t"), c).unwrap();

        let report = f
            .engine
            .remove(&ImageRef::Id(c), &RemoveOptions::default())
            .unwrap();
        assert_eq!(report.untagged, Some(name("t")));
        assert_eq!(report.deleted, vec![c, b, a]);
        assert!(f.tags.is_empty().unwrap());
    }

    #[test]
    fn remove_by_id_refuses_multiple_names() {
        let f = fixture();
        let (_, _, c) = f.chain();
        f.tags.set(&name("t"), c).unwrap();
        f.tags.set(&name("u"), c).unwrap();

        let err = f
            .engine
            .remove(&ImageRef::Id(c), &RemoveOptions::default())
            .unwrap_err();
        assert!(matches!(err, GcError::MultipleTags { ref tags, .. } if tags.len() == 2));
        assert_eq!(f.tags.get(&name("t")).unwrap(), Some(c));
        assert_eq!(f.tags.get(&name("u")).unwrap(), Some(c));
        assert!(f.present(&c));
    }

    #[test]
    fn unknown_references_are_not_found() {
        let f = fixture();
        let err = f
            .engine
            .remove(&by_name("ghost"), &RemoveOptions::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "no such image: ghost:latest");

        let err = f
            .engine
            .remove(&ImageRef::Id(cid("ghost")), &RemoveOptions::default())
            .unwrap_err();
        assert!(matches!(err, GcError::NotFound(_)));
    }

    // ---------------------------------------------------------------
    // Options
    // ---------------------------------------------------------------

    #[test]
    fn no_prune_deletes_only_target() {
        let f = fixture();
        let (a, b, c) = f.chain();
        f.tags.set(&name("t"), c).unwrap();

        let report = f.engine.remove(&by_name("t"), &RemoveOptions::no_prune()).unwrap();
        assert_eq!(report.deleted, vec![c]);
        assert_eq!(report.outcome(), SweepOutcome::Done);
        assert!(f.present(&a));
        assert!(f.present(&b));
    }

    #[test]
    fn cancelled_sweep_keeps_untag() {
        let f = fixture();
        let (a, b, c) = f.chain();
        f.tags.set(&name("t"), c).unwrap();
        let flag = CancelFlag::new();
        flag.cancel();

        let report = f
            .engine
            .remove(&by_name("t"), &RemoveOptions::default().with_cancel(flag))
            .unwrap();
        assert_eq!(report.untagged, Some(name("t")));
        assert!(report.deleted.is_empty());
        assert!(report.cancelled);
        assert!(f.tags.get(&name("t")).unwrap().is_none());
        for id in [a, b, c] {
            assert!(f.present(&id));
        }
    }

    // ---------------------------------------------------------------
    // Collect
    // ---------------------------------------------------------------

    #[test]
    fn collect_after_retag() {
        let f = fixture();
        let (a, b, c) = f.chain();
        f.tags.set(&name("t"), c).unwrap();
        let other = f.nodes.create(ContentNode::child(cid("other"), a)).unwrap();
        let previous = f.tags.set(&name("t"), other).unwrap().unwrap();
        assert_eq!(previous, c);

        let mut report = RemovalReport::default();
        f.engine
            .exclusive()
            .unwrap()
            .sweep(previous, &RemoveOptions::default(), &mut report)
            .unwrap();
        assert_eq!(report.deleted, vec![c, b]);
        assert_eq!(report.blocked, Some((a, Retention::Parent(vec![other]))));
    }

    #[test]
    fn collect_missing_node_is_noop() {
        let f = fixture();
        let mut report = RemovalReport::default();
        f.engine
            .exclusive()
            .unwrap()
            .sweep(cid("ghost"), &RemoveOptions::default(), &mut report)
            .unwrap();
        assert_eq!(report, RemovalReport::default());
    }

    // ---------------------------------------------------------------
    // Guarded mutation
    // ---------------------------------------------------------------

    #[test]
    fn delete_refuses_tagged_node() {
        let f = fixture();
        let (_, _, c) = f.chain();
        f.tags.set(&name("t"), c).unwrap();

        let graph = f.engine.exclusive().unwrap();
        let err = graph.delete(&c).unwrap_err();
        assert!(matches!(
            err,
            GcError::StillReferenced { reason: Retention::Tagged(_), .. }
        ));
        assert!(graph.exists(&c).unwrap());
        assert_eq!(graph.resolve(&by_name("t")).unwrap(), c);
    }

    #[test]
    fn delete_refuses_consumed_node() {
        let f = fixture();
        let (_, _, c) = f.chain();
        let graph = f.engine.exclusive().unwrap();
        graph.add_consumer(c, consumer("ctr")).unwrap();

        let err = graph.delete(&c).unwrap_err();
        assert!(matches!(
            err,
            GcError::StillReferenced { reason: Retention::Consumed(_), .. }
        ));
        assert_eq!(graph.consumed().unwrap(), vec![c]);
        assert!(graph.exists(&c).unwrap());
    }

    #[test]
    fn delete_refuses_parent_and_never_cascades() {
        let f = fixture();
        let (a, b, c) = f.chain();
        let graph = f.engine.exclusive().unwrap();

        let err = graph.delete(&b).unwrap_err();
        assert!(matches!(
            err,
            GcError::StillReferenced { reason: Retention::Parent(ref kids), .. } if kids == &vec![c]
        ));

        assert_eq!(graph.delete(&c).unwrap().id, c);
        assert!(graph.exists(&b).unwrap());
        assert!(graph.exists(&a).unwrap());
        assert!(matches!(graph.delete(&c), Err(GcError::NotFound(_))));
    }

    #[test]
    fn references_to_missing_nodes_are_refused() {
        let f = fixture();
        let graph = f.engine.exclusive().unwrap();
        assert!(matches!(
            graph.set_tag(&name("t"), cid("ghost")),
            Err(GcError::NotFound(_))
        ));
        assert!(matches!(
            graph.add_consumer(cid("ghost"), consumer("ctr")),
            Err(GcError::NotFound(_))
        ));
        assert!(f.tags.is_empty().unwrap());
        assert!(f.tracker.consumed().unwrap().is_empty());
    }

    #[test]
    fn guard_holds_its_own_engine_gate() {
        let f = fixture();
        let other = fixture();
        let (_, _, c) = f.chain();
        let (_, _, other_top) = other.chain();

        let graph = f.engine.exclusive().unwrap();
        assert!(f.engine.gate.try_write().is_err());
        assert!(f.engine.gate.try_read().is_err());

        let mut report = RemovalReport::default();
        graph
            .sweep(c, &RemoveOptions::no_prune(), &mut report)
            .unwrap();
        assert_eq!(report.deleted, vec![c]);
        assert!(other.present(&other_top));

        drop(graph);
        assert!(f.engine.gate.try_write().is_ok());
    }

    #[test]
    fn snapshot_blocks_writers_only() {
        let f = fixture();
        let first = f.engine.shared().unwrap();
        let second = f.engine.shared().unwrap();
        assert!(f.engine.gate.try_write().is_err());
        drop(first);
        drop(second);
        assert!(f.engine.exclusive().is_ok());
    }

    #[test]
    fn retention_precedence() {
        let f = fixture();
        let (_, b, _) = f.chain();
        f.tracker.add_consumer(b, consumer("ctr")).unwrap();
        f.tags.set(&name("mid"), b).unwrap();
        assert!(matches!(
            f.engine.shared().unwrap().retention(&b).unwrap(),
            Some(Retention::Tagged(_))
        ));
        f.tags.remove(&name("mid")).unwrap();
        assert!(matches!(
            f.engine.shared().unwrap().retention(&b).unwrap(),
            Some(Retention::Consumed(_))
        ));
        f.tracker.remove_consumer(&b, &consumer("ctr")).unwrap();
        assert!(matches!(
            f.engine.shared().unwrap().retention(&b).unwrap(),
            Some(Retention::Parent(_))
        ));
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        let f = fixture();
        let mut prev = f.nodes.create(ContentNode::root(cid("layer-0"))).unwrap();
        for i in 1..10_000 {
            prev = f
                .nodes
                .create(ContentNode::child(cid(&format!("layer-{i}")), prev))
                .unwrap();
        }
        f.tags.set(&name("deep"), prev).unwrap();
        let report = f.engine.remove(&by_name("deep"), &RemoveOptions::default()).unwrap();
        assert_eq!(report.deleted.len(), 10_000);
    }

    // ---------------------------------------------------------------
    // Model check
    // ---------------------------------------------------------------

    mod model {
        use super::*;
        use proptest::prelude::*;

        /// Expected deletions computed directly from the reachability rule.
        fn expected_sweep(
            parents: &[Option<usize>],
            tagged: &[bool],
            consumed: &[bool],
            start: usize,
        ) -> Vec<usize> {
            let mut children = vec![0usize; parents.len()];
            for p in parents.iter().flatten() {
                children[*p] += 1;
            }
            let mut deleted = Vec::new();
            let mut cur = Some(start);
            while let Some(i) = cur {
                if tagged[i] || consumed[i] || children[i] > 0 {
                    break;
                }
                deleted.push(i);
                cur = parents[i];
                if let Some(p) = cur {
                    children[p] -= 1;
                }
            }
            deleted
        }

        proptest! {
            #[test]
            fn removal_matches_reachability_model(
                shape in proptest::collection::vec((any::<bool>(), any::<usize>()), 1..24),
                tag_targets in proptest::collection::vec(any::<usize>(), 1..5),
                consumer_targets in proptest::collection::vec(any::<usize>(), 0..5),
            ) {
                let f = fixture();
                let n = shape.len();
                let parents: Vec<Option<usize>> = shape
                    .iter()
                    .enumerate()
                    .map(|(i, (linked, raw))| (*linked && i > 0).then(|| raw % i))
                    .collect();
                let ids: Vec<ContentId> = (0..n).map(|i| cid(&format!("n{i}"))).collect();
                for (i, parent) in parents.iter().enumerate() {
                    f.nodes
                        .create(ContentNode::new(ids[i], parent.map(|p| ids[p])))
                        .unwrap();
                }

                let mut tagged = vec![false; n];
                for (k, raw) in tag_targets.iter().enumerate() {
                    let target = raw % n;
                    f.tags.set(&name(&format!("t{k}")), ids[target]).unwrap();
                    if k > 0 {
                        tagged[target] = true;
                    }
                }
                let mut consumed = vec![false; n];
                for (k, raw) in consumer_targets.iter().enumerate() {
                    let target = raw % n;
                    f.tracker.add_consumer(ids[target], consumer(&format!("c{k}"))).unwrap();
                    consumed[target] = true;
                }

                let start = tag_targets[0] % n;
                let expected: Vec<ContentId> = expected_sweep(&parents, &tagged, &consumed, start)
                    .into_iter()
                    .map(|i| ids[i])
                    .collect();

                let report = f.engine.remove(&by_name("t0"), &RemoveOptions::default()).unwrap();
                prop_assert_eq!(&report.deleted, &expected);

                // Every surviving node still has its parent, and no tag or
                // consumer points at a deleted node.
                for id in f.nodes.all_ids().unwrap() {
                    if let Some(parent) = f.nodes.get(&id).unwrap().unwrap().parent {
                        prop_assert!(f.nodes.exists(&parent).unwrap());
                    }
                }
                for tag in f.tags.list().unwrap() {
                    prop_assert!(f.nodes.exists(&tag.target).unwrap());
                }
                for id in f.tracker.consumed().unwrap() {
                    prop_assert!(f.nodes.exists(&id).unwrap());
                }
                prop_assert_eq!(f.nodes.len().unwrap(), n - expected.len());
            }
        }
    }
}
