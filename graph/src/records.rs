//! Serialized form of the component graph, as written by the upstream graph builder.
//!
//! ```json
//! {
//!   "components": [{ "id": "group/proj/wf.cwl", "kind": "Workflow" }],
//!   "parameters": [{ "component": "group/proj/wf.cwl", "id": "reads", "direction": "in", "type": "File" }],
//!   "data": [{ "component": "group/proj/wf.cwl", "name": "flag" }],
//!   "data_flow": [{
//!     "source": { "kind": "in", "component": "group/proj/wf.cwl", "id": "reads" },
//!     "target": { "kind": "in", "component": "group/proj/align.cwl", "id": "reads" },
//!     "component": "group/proj/wf.cwl", "step": "align", "data": "reads"
//!   }],
//!   "control": [{
//!     "source": { "kind": "component", "component": "group/proj/align.cwl" },
//!     "target": { "kind": "data", "component": "group/proj/wf.cwl", "name": "flag" },
//!     "component": "group/proj/wf.cwl", "data": ["flag"]
//!   }]
//! }
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{ComponentKind, Direction, Errors, GraphAccess, GraphStore, NodeId};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct GraphRecords {
    #[serde(default)]
    pub components: Vec<ComponentRecord>,
    #[serde(default)]
    pub parameters: Vec<ParameterRecord>,
    #[serde(default)]
    pub data: Vec<DataRecord>,
    #[serde(default)]
    pub data_flow: Vec<DataFlowRecord>,
    #[serde(default)]
    pub control: Vec<ControlRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub id: String,
    pub kind: ComponentKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub component: String,
    pub id: String,
    pub direction: Direction,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataRecord {
    pub component: String,
    pub name: String,
}

/// Reference to an endpoint node by its natural key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeRef {
    Component { component: String },
    In { component: String, id: String },
    Out { component: String, id: String },
    Data { component: String, name: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFlowRecord {
    pub source: NodeRef,
    pub target: NodeRef,
    pub component: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlRecord {
    pub source: NodeRef,
    pub target: NodeRef,
    pub component: String,
    #[serde(default)]
    pub data: Vec<String>,
}

/// Options applied while turning records into a [`GraphStore`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Local-folder prefix removed from every component id, if present.
    pub strip_prefix: Option<String>,
}

impl LoadOptions {
    fn clean<'a>(&self, id: &'a str) -> &'a str {
        match &self.strip_prefix {
            Some(prefix) => id.strip_prefix(prefix.as_str()).unwrap_or(id),
            None => id,
        }
    }
}

impl GraphRecords {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Materialize the records into a store.
    ///
    /// Records that reference undeclared components or nodes are skipped with a
    /// warning; so are edges whose scope cannot legitimately connect their endpoints,
    /// although those are still added.
    pub fn into_store(self, opts: &LoadOptions, errors: &mut Errors) -> Result<GraphStore> {
        let mut store = GraphStore::default();

        for c in &self.components {
            store.add_component(opts.clean(&c.id), c.kind)?;
        }

        for p in &self.parameters {
            let component = opts.clean(&p.component);
            if let Err(e) =
                store.add_parameter(component, &p.id, p.direction, p.declared_type.as_deref())
            {
                errors.warn(format!("Skipping parameter '{}' of {component}: {e}", p.id));
            }
        }

        for d in &self.data {
            let component = opts.clean(&d.component);
            if let Err(e) = store.add_data(component, &d.name) {
                errors.warn(format!("Skipping data item '{}' of {component}: {e}", d.name));
            }
        }

        for f in &self.data_flow {
            let scope = opts.clean(&f.component);
            let Some((source, target)) = resolve_pair(&store, opts, &f.source, &f.target, errors)
            else {
                continue;
            };
            if let Err(e) = store.add_data_flow(source, target, scope, f.step.as_deref(), &f.data) {
                errors.warn(format!("Skipping data flow '{}' in {scope}: {e}", f.data));
            }
        }

        for c in &self.control {
            let scope = opts.clean(&c.component);
            let Some((source, target)) = resolve_pair(&store, opts, &c.source, &c.target, errors)
            else {
                continue;
            };
            let data: Vec<&str> = c.data.iter().map(String::as_str).collect();
            if let Err(e) = store.add_control_dependency(source, target, scope, &data) {
                errors.warn(format!("Skipping control dependency in {scope}: {e}"));
            }
        }

        for edge in store.scope_violations() {
            let Some(e) = store.get_edge(edge) else {
                continue;
            };
            errors.warn(format!(
                "Edge {} -> {} is owned by {}, which cannot connect them",
                store.describe_node(e.source)?,
                store.describe_node(e.target)?,
                store.strings().component(e.component)?,
            ));
        }

        log::info!(
            "Loaded graph with {} nodes and {} edges",
            store.num_nodes(),
            store.num_edges()
        );
        store.strings().log_sizes();
        Ok(store)
    }
}

fn resolve_pair(
    store: &GraphStore,
    opts: &LoadOptions,
    source: &NodeRef,
    target: &NodeRef,
    errors: &mut Errors,
) -> Option<(NodeId, NodeId)> {
    let source = resolve(store, opts, source, errors)?;
    let target = resolve(store, opts, target, errors)?;
    Some((source, target))
}

fn resolve(
    store: &GraphStore,
    opts: &LoadOptions,
    node: &NodeRef,
    errors: &mut Errors,
) -> Option<NodeId> {
    let found = match node {
        NodeRef::Component { component } => store
            .find_component(opts.clean(component))
            .and_then(|c| store.component_node(c)),
        NodeRef::In { component, id } => {
            store.find_parameter(opts.clean(component), id, Direction::In)
        }
        NodeRef::Out { component, id } => {
            store.find_parameter(opts.clean(component), id, Direction::Out)
        }
        NodeRef::Data { component, name } => store.find_data(opts.clean(component), name),
    };
    if found.is_none() {
        errors.warn(format!("Unresolved node reference {node:?}; skipping edge"));
    }
    found
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::NodeKind;

    const GRAPH: &str = r#"{
        "components": [
            { "id": "/home/me/repos/g/p/wf.cwl", "kind": "Workflow" },
            { "id": "/home/me/repos/g/p/tool.cwl", "kind": "CommandLineTool" }
        ],
        "parameters": [
            { "component": "/home/me/repos/g/p/wf.cwl", "id": "x", "direction": "in", "type": "File" },
            { "component": "/home/me/repos/g/p/tool.cwl", "id": "a", "direction": "in" },
            { "component": "/home/me/repos/g/p/missing.cwl", "id": "a", "direction": "in" }
        ],
        "data": [
            { "component": "/home/me/repos/g/p/wf.cwl", "name": "flag" }
        ],
        "data_flow": [
            {
                "source": { "kind": "in", "component": "/home/me/repos/g/p/wf.cwl", "id": "x" },
                "target": { "kind": "in", "component": "/home/me/repos/g/p/tool.cwl", "id": "a" },
                "component": "/home/me/repos/g/p/wf.cwl", "step": "run", "data": "x"
            },
            {
                "source": { "kind": "out", "component": "/home/me/repos/g/p/tool.cwl", "id": "nope" },
                "target": { "kind": "in", "component": "/home/me/repos/g/p/tool.cwl", "id": "a" },
                "component": "/home/me/repos/g/p/wf.cwl", "data": "x"
            }
        ],
        "control": [
            {
                "source": { "kind": "component", "component": "/home/me/repos/g/p/tool.cwl" },
                "target": { "kind": "data", "component": "/home/me/repos/g/p/wf.cwl", "name": "flag" },
                "component": "/home/me/repos/g/p/wf.cwl", "data": ["flag"]
            }
        ]
    }"#;

    #[test]
    fn test_load_with_prefix_and_warnings() -> Result<()> {
        let records = GraphRecords::from_json(GRAPH)?;
        let opts = LoadOptions {
            strip_prefix: Some("/home/me/repos/".to_owned()),
        };
        let mut errors = Errors::default();
        let store = records.into_store(&opts, &mut errors)?;

        let wf = store.find_component("g/p/wf.cwl").unwrap();
        let tool = store.find_component("g/p/tool.cwl").unwrap();
        assert_eq!(ComponentKind::Tool, store.component_kind(tool)?);
        assert_eq!(vec![wf], store.workflow_ids()?);

        let x = store.find_parameter("g/p/wf.cwl", "x", Direction::In).unwrap();
        let conns = store.connections(x, wf, None)?;
        assert_eq!(1, conns.len());
        assert_eq!(NodeKind::InParameter, conns[0].target_kind);
        assert_eq!(tool, conns[0].target_component);

        assert_eq!(1, store.control_edges()?.len());
        // missing component and unresolved endpoint:
        assert_eq!(2, errors.num_warnings());
        assert!(!errors.has_errors());
        Ok(())
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(GraphRecords::from_json("{ \"components\": 3 }").is_err());
    }
}
