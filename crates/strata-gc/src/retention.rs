use std::fmt;

use serde::{Deserialize, Serialize};

use strata_refs::TagName;
use strata_types::{ConsumerId, ContentId};

/// Why a node cannot be collected.
///
/// When several reasons hold, the first in declaration order is reported.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Retention {
    /// One or more tags name the node.
    Tagged(Vec<TagName>),
    /// One or more consumers depend on the node.
    Consumed(Vec<ConsumerId>),
    /// One or more child nodes are layered on the node.
    Parent(Vec<ContentId>),
}

impl fmt::Display for Retention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tagged(names) => write!(f, "tagged ({} name(s))", names.len()),
            Self::Consumed(consumers) => write!(f, "in use ({} consumer(s))", consumers.len()),
            Self::Parent(children) => write!(f, "parent of {} node(s)", children.len()),
        }
    }
}
