//! The component graph: components, their parameters, data items, and the
//! data-flow and control-dependency edges between them, plus the accessor
//! interface traversals use to read it and record workflow memberships on it.

/// Typed ids for interned strings and graph arena indices.
mod id;
pub use id::{ComponentId, DataId, EdgeId, LabelId, NodeId, StepId};

/// Interned strings for component, step, data, and label ids.
mod strings;
pub use strings::{has_step_prefix, GraphStrings};

mod node;
pub use node::{ComponentKind, Direction, Node, NodeKind};

mod edge;
pub use edge::{Edge, EdgeKind};

mod membership;
pub use membership::Membership;

/// Accessor trait and the records it returns.
mod access;
pub use access::{AccessError, Connection, ControlEdge, GraphAccess, NodeDetails};

/// In-memory implementation of the accessor.
mod store;
pub use store::GraphStore;

mod retry;
pub use retry::{Backoff, RetryPolicy, Retrying};

/// JSON records written by the upstream graph builder.
pub mod records;
pub use records::{GraphRecords, LoadOptions};

mod error;
pub use error::{AggregatedErrors, Errors, Recap, Recapper};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Component '{0}' has not been declared")]
    UnknownComponent(String),
    #[error("Component '{0}' declared twice with different kinds")]
    ConflictingKind(String),
    #[error("Node {0:?} does not exist")]
    UnknownNode(NodeId),
    #[error("Unknown backoff strategy '{0}'; expected fixed, linear or exponential")]
    UnknownBackoff(String),
}
