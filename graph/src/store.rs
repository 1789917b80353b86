use anyhow::Result;

use intern::{GetStr, InternStr, LookupStr};
use util::{HashMap, HashSet, Hasher, IdVec};

use crate::strings::has_step_prefix;
use crate::{
    AccessError, ComponentId, ComponentKind, Connection, ControlEdge, Direction, Edge, EdgeId,
    EdgeKind, Error, GraphAccess, GraphStrings, LabelId, Membership, Node, NodeDetails, NodeId,
    NodeKind, StepId,
};

#[derive(Debug)]
struct ComponentEntry {
    kind: ComponentKind,
    /// the component's own node
    node: NodeId,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
}

/// In-memory graph store.
///
/// Nodes and edges are created while loading and never removed;
/// the only thing that changes afterwards are membership annotations.
#[derive(Debug)]
pub struct GraphStore {
    strings: GraphStrings,
    components: HashMap<ComponentId, ComponentEntry>,
    nodes: IdVec<NodeId, Node>,
    edges: IdVec<EdgeId, Edge>,
    /// outgoing edges, indexed by source node
    outgoing: IdVec<NodeId, Vec<EdgeId>>,
    node_membership: IdVec<NodeId, Membership>,
    edge_membership: IdVec<EdgeId, Membership>,
    /// dedupe parameters by (component, direction, parameter id):
    parameters: HashMap<(ComponentId, Direction, LabelId), NodeId>,
    /// dedupe data items by (component, name):
    data_items: HashMap<(ComponentId, LabelId), NodeId>,
    /// control dependencies accumulate data ids instead of creating new edges:
    control: HashMap<(NodeId, NodeId, ComponentId), EdgeId>,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self {
            strings: GraphStrings::default(),
            components: HashMap::with_capacity_and_hasher(64, Hasher::default()),
            nodes: IdVec::with_capacity(256),
            edges: IdVec::with_capacity(512),
            outgoing: IdVec::with_capacity(256),
            node_membership: IdVec::with_capacity(256),
            edge_membership: IdVec::with_capacity(512),
            parameters: HashMap::with_capacity_and_hasher(256, Hasher::default()),
            data_items: HashMap::with_capacity_and_hasher(64, Hasher::default()),
            control: HashMap::with_capacity_and_hasher(16, Hasher::default()),
        }
    }
}

// building the graph /////////////
impl GraphStore {
    /// Declare a component. Declaring the same id twice with the same kind is a no-op.
    pub fn add_component(&mut self, id: &str, kind: ComponentKind) -> Result<ComponentId> {
        let component = self.strings.components.intern(id)?;
        if let Some(entry) = self.components.get(&component) {
            if entry.kind != kind {
                return Err(Error::ConflictingKind(id.to_owned()).into());
            }
            return Ok(component);
        }
        let node = self.push_node(Node {
            component,
            kind: NodeKind::Component,
            label: None,
            declared_type: None,
        });
        self.components.insert(
            component,
            ComponentEntry {
                kind,
                node,
                inputs: Vec::with_capacity(4),
                outputs: Vec::with_capacity(4),
            },
        );
        Ok(component)
    }

    /// Add an in or out parameter to a declared component.
    pub fn add_parameter(
        &mut self,
        component: &str,
        id: &str,
        direction: Direction,
        declared_type: Option<&str>,
    ) -> Result<NodeId> {
        let component = self.declared(component)?;
        let label = self.strings.labels.intern(id)?;
        if let Some(node) = self.parameters.get(&(component, direction, label)) {
            return Ok(*node);
        }
        let declared_type = match declared_type {
            Some(ty) => Some(self.strings.labels.intern(ty)?),
            None => None,
        };
        let node = self.push_node(Node {
            component,
            kind: NodeKind::parameter(direction),
            label: Some(label),
            declared_type,
        });
        self.parameters.insert((component, direction, label), node);

        let entry = self
            .components
            .get_mut(&component)
            .ok_or(AccessError::ComponentNotFound(component))?;
        match direction {
            Direction::In => entry.inputs.push(node),
            Direction::Out => entry.outputs.push(node),
        }
        Ok(node)
    }

    /// Add a data item scoped to a declared component.
    pub fn add_data(&mut self, component: &str, name: &str) -> Result<NodeId> {
        let component = self.declared(component)?;
        let label = self.strings.labels.intern(name)?;
        if let Some(node) = self.data_items.get(&(component, label)) {
            return Ok(*node);
        }
        let node = self.push_node(Node {
            component,
            kind: NodeKind::Data,
            label: Some(label),
            declared_type: None,
        });
        self.data_items.insert((component, label), node);
        Ok(node)
    }

    /// Add a data-flow edge owned by `scope`. An empty `step` counts as no step.
    pub fn add_data_flow(
        &mut self,
        source: NodeId,
        target: NodeId,
        scope: &str,
        step: Option<&str>,
        data: &str,
    ) -> Result<EdgeId> {
        self.check_node(source)?;
        self.check_node(target)?;
        let component = self.declared(scope)?;
        let step = match step {
            Some(s) if !s.is_empty() => Some(self.strings.steps.intern(s)?),
            _ => None,
        };
        let data = self.strings.data.intern(data)?;
        Ok(self.push_edge(Edge {
            source,
            target,
            component,
            kind: EdgeKind::DataFlow { step, data },
        }))
    }

    /// Add a control dependency, or merge `data` into an existing one
    /// with the same endpoints and scope.
    pub fn add_control_dependency(
        &mut self,
        source: NodeId,
        target: NodeId,
        scope: &str,
        data: &[&str],
    ) -> Result<EdgeId> {
        self.check_node(source)?;
        self.check_node(target)?;
        let component = self.declared(scope)?;
        let mut data_ids = Vec::with_capacity(data.len());
        for d in data {
            data_ids.push(self.strings.data.intern(d)?);
        }

        let edge_id = match self.control.get(&(source, target, component)) {
            Some(edge_id) => *edge_id,
            None => {
                let edge_id = self.push_edge(Edge {
                    source,
                    target,
                    component,
                    kind: EdgeKind::ControlDependency {
                        data: Vec::with_capacity(data_ids.len()),
                    },
                });
                self.control.insert((source, target, component), edge_id);
                edge_id
            }
        };

        let edge = self
            .edges
            .get_mut(edge_id)
            .ok_or(AccessError::EdgeNotFound(edge_id))?;
        if let EdgeKind::ControlDependency { data } = &mut edge.kind {
            for id in data_ids {
                if !data.contains(&id) {
                    data.push(id);
                }
            }
        }
        Ok(edge_id)
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        let id = self.nodes.push(node);
        self.outgoing.push(Vec::with_capacity(2));
        self.node_membership.push(Membership::default());
        id
    }

    fn push_edge(&mut self, edge: Edge) -> EdgeId {
        let source = edge.source;
        let id = self.edges.push(edge);
        self.edge_membership.push(Membership::default());
        if let Some(outgoing) = self.outgoing.get_mut(source) {
            outgoing.push(id);
        }
        id
    }

    fn declared(&self, component: &str) -> Result<ComponentId, Error> {
        self.find_component(component)
            .filter(|id| self.components.contains_key(id))
            .ok_or_else(|| Error::UnknownComponent(component.to_owned()))
    }

    fn check_node(&self, node: NodeId) -> Result<(), Error> {
        match self.nodes.get(node) {
            Some(_) => Ok(()),
            None => Err(Error::UnknownNode(node)),
        }
    }
}

// lookups used while loading and reporting /////////////
impl GraphStore {
    pub fn find_component(&self, id: &str) -> Option<ComponentId> {
        self.strings.components.lookup(id)
    }

    /// The node representing the component itself.
    pub fn component_node(&self, component: ComponentId) -> Option<NodeId> {
        self.components.get(&component).map(|entry| entry.node)
    }

    pub fn find_parameter(&self, component: &str, id: &str, direction: Direction) -> Option<NodeId> {
        let component = self.find_component(component)?;
        let label = self.strings.labels.lookup(id)?;
        self.parameters.get(&(component, direction, label)).copied()
    }

    pub fn find_data(&self, component: &str, name: &str) -> Option<NodeId> {
        let component = self.find_component(component)?;
        let label = self.strings.labels.lookup(name)?;
        self.data_items.get(&(component, label)).copied()
    }

    pub fn get_node(&self, node: NodeId) -> Option<&Node> {
        self.nodes.get(node)
    }

    pub fn get_edge(&self, edge: EdgeId) -> Option<&Edge> {
        self.edges.get(edge)
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Edges whose scope is neither endpoint's component nor a workflow
    /// that could legitimately connect them.
    ///
    /// A workflow connects two other components only if it wires one of them
    /// through some other data-flow edge as well.
    pub fn scope_violations(&self) -> Vec<EdgeId> {
        // (scope, component) -> number of data-flow edges in scope touching component
        let mut wired: HashMap<(ComponentId, ComponentId), usize> =
            HashMap::with_capacity_and_hasher(self.edges.len(), Hasher::default());
        for (_, edge) in self.edges.iter_ids().filter(|(_, e)| e.is_data_flow()) {
            for component in self.endpoint_components(edge) {
                *wired.entry((edge.component, component)).or_default() += 1;
            }
        }

        self.edges
            .iter_ids()
            .filter(|(_, edge)| !self.is_legitimate_scope(edge, &wired))
            .map(|(id, _)| id)
            .collect()
    }

    /// `ids` ordered by their component id strings.
    fn sorted_by_name(
        &self,
        ids: impl Iterator<Item = ComponentId>,
    ) -> Result<Vec<ComponentId>, AccessError> {
        let mut named = ids
            .map(|id| match self.strings.components.get(id) {
                Ok(name) => Ok((name, id)),
                Err(_) => Err(AccessError::ComponentNotFound(id)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        named.sort_unstable();
        Ok(named.into_iter().map(|(_, id)| id).collect())
    }

    /// Distinct components owning the endpoints of `edge`.
    fn endpoint_components(&self, edge: &Edge) -> Vec<ComponentId> {
        let mut components: Vec<ComponentId> = [edge.source, edge.target]
            .iter()
            .filter_map(|node| self.nodes.get(*node).map(|n| n.component))
            .collect();
        components.dedup();
        components
    }

    fn is_legitimate_scope(
        &self,
        edge: &Edge,
        wired: &HashMap<(ComponentId, ComponentId), usize>,
    ) -> bool {
        let endpoints = self.endpoint_components(edge);
        if endpoints.contains(&edge.component) {
            return true;
        }
        let is_workflow = self
            .components
            .get(&edge.component)
            .map(|entry| entry.kind.is_workflow())
            .unwrap_or(false);
        if !is_workflow {
            return false;
        }
        let own = usize::from(edge.is_data_flow());
        endpoints.iter().any(|component| {
            wired
                .get(&(edge.component, *component))
                .is_some_and(|count| *count > own)
        })
    }

    /// All nodes that carry a non-empty membership annotation.
    pub fn annotated_nodes(&self) -> impl Iterator<Item = (NodeId, &Node, &Membership)> {
        self.nodes
            .iter_ids()
            .zip(self.node_membership.iter())
            .filter(|(_, membership)| !membership.is_empty())
            .map(|((id, node), membership)| (id, node, membership))
    }

    /// All edges that carry a non-empty membership annotation.
    pub fn annotated_edges(&self) -> impl Iterator<Item = (EdgeId, &Edge, &Membership)> {
        self.edges
            .iter_ids()
            .zip(self.edge_membership.iter())
            .filter(|(_, membership)| !membership.is_empty())
            .map(|((id, edge), membership)| (id, edge, membership))
    }

    /// Human-readable "component:label" for a node, used in warnings and output.
    pub fn describe_node(&self, node: NodeId) -> Result<String> {
        let n = self.nodes.get(node).ok_or(AccessError::NodeNotFound(node))?;
        let component = self.strings.components.get(n.component)?;
        let label = match n.label {
            Some(label) => self.strings.labels.get(label)?,
            None => "",
        };
        let kind = match n.kind {
            NodeKind::Component => "component",
            NodeKind::InParameter => "in",
            NodeKind::OutParameter => "out",
            NodeKind::Data => "data",
        };
        Ok(format!("{component}:{kind}:{label}"))
    }
}

impl GraphAccess for GraphStore {
    fn strings(&self) -> &GraphStrings {
        &self.strings
    }

    fn workflow_ids(&self) -> Result<Vec<ComponentId>, AccessError> {
        self.sorted_by_name(
            self.components
                .iter()
                .filter(|(_, entry)| entry.kind.is_workflow())
                .map(|(id, _)| *id),
        )
    }

    fn component_ids(&self) -> Result<Vec<ComponentId>, AccessError> {
        self.sorted_by_name(self.components.keys().copied())
    }

    fn component_kind(&self, component: ComponentId) -> Result<ComponentKind, AccessError> {
        self.components
            .get(&component)
            .map(|entry| entry.kind)
            .ok_or(AccessError::ComponentNotFound(component))
    }

    fn in_parameters(&self, component: ComponentId) -> Result<Vec<NodeId>, AccessError> {
        self.components
            .get(&component)
            .map(|entry| entry.inputs.clone())
            .ok_or(AccessError::ComponentNotFound(component))
    }

    fn out_parameters(&self, component: ComponentId) -> Result<Vec<NodeId>, AccessError> {
        self.components
            .get(&component)
            .map(|entry| entry.outputs.clone())
            .ok_or(AccessError::ComponentNotFound(component))
    }

    fn node(&self, node: NodeId) -> Result<NodeDetails, AccessError> {
        let n = self.nodes.get(node).ok_or(AccessError::NodeNotFound(node))?;
        Ok(NodeDetails {
            component: n.component,
            kind: n.kind,
            component_kind: self.component_kind(n.component)?,
        })
    }

    fn connections(
        &self,
        node: NodeId,
        scope: ComponentId,
        step: Option<StepId>,
    ) -> Result<Vec<Connection>, AccessError> {
        let outgoing = self
            .outgoing
            .get(node)
            .ok_or(AccessError::NodeNotFound(node))?;
        let step_str = match step {
            Some(s) => Some(
                self.strings
                    .steps
                    .get(s)
                    .map_err(|_| AccessError::StepNotFound(s))?,
            ),
            None => None,
        };

        let mut connections = Vec::with_capacity(outgoing.len());
        for edge_id in outgoing {
            let edge = self
                .edges
                .get(*edge_id)
                .ok_or(AccessError::EdgeNotFound(*edge_id))?;
            if edge.component != scope {
                continue;
            }
            let EdgeKind::DataFlow { step: edge_step, data } = &edge.kind else {
                continue;
            };
            if let Some(step_str) = step_str {
                let data_str = self
                    .strings
                    .data
                    .get(*data)
                    .map_err(|_| AccessError::DataNotFound(*data))?;
                if !has_step_prefix(data_str, step_str) {
                    continue;
                }
            }
            let target = self
                .nodes
                .get(edge.target)
                .ok_or(AccessError::NodeNotFound(edge.target))?;
            connections.push(Connection {
                edge: *edge_id,
                target: edge.target,
                target_component: target.component,
                target_kind: target.kind,
                data: *data,
                step: *edge_step,
            });
        }
        Ok(connections)
    }

    fn ordering_edges(&self) -> Result<Vec<(ComponentId, ComponentId)>, AccessError> {
        let mut seen = HashSet::with_capacity_and_hasher(16, Hasher::default());
        for edge in self.edges.iter().filter(|e| e.is_data_flow()) {
            let source = self
                .nodes
                .get(edge.source)
                .ok_or(AccessError::NodeNotFound(edge.source))?;
            let target = self
                .nodes
                .get(edge.target)
                .ok_or(AccessError::NodeNotFound(edge.target))?;
            if source.kind != NodeKind::InParameter
                || target.kind != NodeKind::InParameter
                || source.component == target.component
            {
                continue;
            }
            let both_workflows = self.component_kind(source.component)?.is_workflow()
                && self.component_kind(target.component)?.is_workflow();
            if both_workflows {
                seen.insert((source.component, target.component));
            }
        }
        let mut pairs: Vec<_> = seen.into_iter().collect();
        pairs.sort_unstable();
        Ok(pairs)
    }

    fn control_edges(&self) -> Result<Vec<ControlEdge>, AccessError> {
        Ok(self
            .edges
            .iter_ids()
            .filter(|(_, edge)| !edge.is_data_flow())
            .map(|(id, edge)| ControlEdge {
                edge: id,
                source: edge.source,
                target: edge.target,
                component: edge.component,
            })
            .collect())
    }

    fn node_membership(&self, node: NodeId) -> Result<Membership, AccessError> {
        self.node_membership
            .get(node)
            .cloned()
            .ok_or(AccessError::NodeNotFound(node))
    }

    fn edge_membership(&self, edge: EdgeId) -> Result<Membership, AccessError> {
        self.edge_membership
            .get(edge)
            .cloned()
            .ok_or(AccessError::EdgeNotFound(edge))
    }

    fn annotate_node(
        &mut self,
        node: NodeId,
        workflows: &[ComponentId],
    ) -> Result<(), AccessError> {
        self.node_membership
            .get_mut(node)
            .ok_or(AccessError::NodeNotFound(node))?
            .union(workflows);
        Ok(())
    }

    fn annotate_edge(
        &mut self,
        edge: EdgeId,
        workflows: &[ComponentId],
    ) -> Result<(), AccessError> {
        self.edge_membership
            .get_mut(edge)
            .ok_or(AccessError::EdgeNotFound(edge))?
            .union(workflows);
        Ok(())
    }
}
