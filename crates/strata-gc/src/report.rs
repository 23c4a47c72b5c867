//! Options and results for a removal request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use strata_refs::TagName;
use strata_types::ContentId;

use crate::retention::Retention;

/// Shared flag a caller raises to stop an in-flight sweep.
///
/// Work finished before the flag was seen stays finished: an untag is never
/// restored and deleted nodes are never recreated.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the sweep to stop before its next step.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options for a removal request.
#[derive(Clone, Debug)]
pub struct RemoveOptions {
    /// Keep walking to the parent after deleting a node. When `false`, at
    /// most the resolved node itself is deleted.
    pub prune_parents: bool,
    /// Optional cancellation flag, checked before every collection step.
    pub cancel: Option<CancelFlag>,
}

impl Default for RemoveOptions {
    fn default() -> Self {
        Self {
            prune_parents: true,
            cancel: None,
        }
    }
}

impl RemoveOptions {
    /// Delete at most the resolved node, leaving its parents alone.
    pub fn no_prune() -> Self {
        Self {
            prune_parents: false,
            ..Self::default()
        }
    }

    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }
}

/// How a sweep ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepOutcome {
    /// Walked off the root of the chain, or pruning was disabled.
    Done,
    /// Stopped at a node that is still referenced.
    Blocked,
    /// Stopped because the caller raised the cancel flag.
    Cancelled,
}

/// One line of removal output, in the order it happened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalEvent {
    Untagged(TagName),
    Deleted(ContentId),
}

/// What a removal request actually did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalReport {
    /// The tag removed during untagging, if the caller passed a name.
    pub untagged: Option<TagName>,
    /// Nodes deleted, starting at the resolved node and moving upward.
    pub deleted: Vec<ContentId>,
    /// The node that stopped the sweep and why.
    pub blocked: Option<(ContentId, Retention)>,
    /// The sweep stopped early on the cancel flag.
    pub cancelled: bool,
}

impl RemovalReport {
    pub fn outcome(&self) -> SweepOutcome {
        if self.cancelled {
            SweepOutcome::Cancelled
        } else if self.blocked.is_some() {
            SweepOutcome::Blocked
        } else {
            SweepOutcome::Done
        }
    }

    /// Removal output as untag/delete events.
    pub fn events(&self) -> Vec<RemovalEvent> {
        self.untagged
            .iter()
            .cloned()
            .map(RemovalEvent::Untagged)
            .chain(self.deleted.iter().copied().map(RemovalEvent::Deleted))
            .collect()
    }
}
