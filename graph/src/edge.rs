use crate::{ComponentId, DataId, NodeId, StepId};

/// A directed edge in the graph store.
#[derive(Debug, Clone)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    /// Scope (usually a workflow) in which this edge is meaningful.
    pub component: ComponentId,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeKind {
    DataFlow {
        /// Step instantiation this edge enters, if any.
        step: Option<StepId>,
        data: DataId,
    },
    ControlDependency {
        /// Deduplicated data ids that trigger the dependency, in insertion order.
        data: Vec<DataId>,
    },
}

impl Edge {
    #[inline]
    pub fn is_data_flow(&self) -> bool {
        matches!(self.kind, EdgeKind::DataFlow { .. })
    }
}
