use crate::{
    ComponentId, ComponentKind, DataId, EdgeId, GraphStrings, Membership, NodeId, NodeKind, StepId,
};

/// Errors returned by a graph accessor.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AccessError {
    #[error("Graph store unavailable: {0}")]
    Unavailable(String),
    #[error("Graph store still unavailable after {0} attempts: {1}")]
    RetriesExhausted(u32, String),
    #[error("Node {0:?} not found in graph store")]
    NodeNotFound(NodeId),
    #[error("Edge {0:?} not found in graph store")]
    EdgeNotFound(EdgeId),
    #[error("Component {0:?} not found in graph store")]
    ComponentNotFound(ComponentId),
    #[error("Step {0:?} not found in graph store")]
    StepNotFound(StepId),
    #[error("Data id {0:?} not found in graph store")]
    DataNotFound(DataId),
}

impl AccessError {
    /// Connectivity problems that may go away if the request is repeated.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Missing records; reported as warnings rather than aborting a traversal.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NodeNotFound(_)
                | Self::EdgeNotFound(_)
                | Self::ComponentNotFound(_)
                | Self::StepNotFound(_)
                | Self::DataNotFound(_)
        )
    }
}

/// What a traversal needs to know about a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeDetails {
    pub component: ComponentId,
    pub kind: NodeKind,
    pub component_kind: ComponentKind,
}

/// One outgoing data-flow edge, with enough about its target to continue a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub edge: EdgeId,
    pub target: NodeId,
    pub target_component: ComponentId,
    pub target_kind: NodeKind,
    pub data: DataId,
    pub step: Option<StepId>,
}

/// A control-dependency edge, as seen by the membership propagation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlEdge {
    pub edge: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub component: ComponentId,
}

/// Request/response interface to the graph store.
///
/// Read operations take `&self`; membership writes take `&mut self` and must be
/// additive unions, so repeating one is harmless.
pub trait GraphAccess {
    /// Interned strings backing the ids returned by this accessor.
    fn strings(&self) -> &GraphStrings;

    /// All components declared as workflows, sorted by component id string.
    fn workflow_ids(&self) -> Result<Vec<ComponentId>, AccessError>;

    /// All declared components, sorted by component id string.
    fn component_ids(&self) -> Result<Vec<ComponentId>, AccessError>;

    fn component_kind(&self, component: ComponentId) -> Result<ComponentKind, AccessError>;

    /// Entry (direction=in) parameter nodes of `component`.
    fn in_parameters(&self, component: ComponentId) -> Result<Vec<NodeId>, AccessError>;

    /// Exit (direction=out) parameter nodes of `component`.
    fn out_parameters(&self, component: ComponentId) -> Result<Vec<NodeId>, AccessError>;

    fn node(&self, node: NodeId) -> Result<NodeDetails, AccessError>;

    /// Outgoing data-flow edges of `node` owned by `scope`. If `step` is given,
    /// only edges whose data id starts with "{step}/" are returned.
    fn connections(
        &self,
        node: NodeId,
        scope: ComponentId,
        step: Option<StepId>,
    ) -> Result<Vec<Connection>, AccessError>;

    /// (caller, callee) pairs taken from data-flow edges between in-parameters
    /// of two different workflows.
    fn ordering_edges(&self) -> Result<Vec<(ComponentId, ComponentId)>, AccessError>;

    fn control_edges(&self) -> Result<Vec<ControlEdge>, AccessError>;

    fn node_membership(&self, node: NodeId) -> Result<Membership, AccessError>;

    fn edge_membership(&self, edge: EdgeId) -> Result<Membership, AccessError>;

    /// Union `workflows` into the membership of `node`.
    fn annotate_node(&mut self, node: NodeId, workflows: &[ComponentId])
        -> Result<(), AccessError>;

    /// Union `workflows` into the membership of `edge`.
    fn annotate_edge(&mut self, edge: EdgeId, workflows: &[ComponentId])
        -> Result<(), AccessError>;
}
