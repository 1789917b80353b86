use serde::{Deserialize, Serialize};

use crate::{ComponentId, LabelId};

/// What kind of definition unit a component is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Workflow,
    #[serde(alias = "CommandLineTool")]
    Tool,
    ExpressionTool,
}

impl ComponentKind {
    #[inline]
    pub fn is_workflow(self) -> bool {
        self == Self::Workflow
    }
}

/// Direction of a parameter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

/// Closed set of node labels in the component graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The component itself; source of control dependencies.
    Component,
    InParameter,
    OutParameter,
    /// A named data item scoped to a component.
    Data,
}

impl NodeKind {
    pub fn parameter(direction: Direction) -> Self {
        match direction {
            Direction::In => Self::InParameter,
            Direction::Out => Self::OutParameter,
        }
    }
}

/// A node in the graph store.
#[derive(Debug, Clone)]
pub struct Node {
    /// Component that owns this node (for data items: the referencing component).
    pub component: ComponentId,
    pub kind: NodeKind,
    /// Parameter id or data item name; None for component nodes.
    pub label: Option<LabelId>,
    /// Declared type of a parameter, kept opaque.
    pub declared_type: Option<LabelId>,
}
