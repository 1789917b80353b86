use std::collections::BTreeMap;

use anyhow::Result;
use serde::Serialize;

use graph::{GraphAccess, GraphStore, Membership};

#[derive(Debug, Serialize, PartialEq)]
pub struct EdgeMembership {
    pub source: String,
    pub target: String,
    pub scope: String,
    pub workflows: Vec<String>,
}

/// Annotated memberships keyed by readable node descriptions.
#[derive(Debug, Default, Serialize)]
pub struct MembershipDump {
    pub nodes: BTreeMap<String, Vec<String>>,
    pub edges: Vec<EdgeMembership>,
}

impl MembershipDump {
    pub fn collect(store: &GraphStore) -> Result<Self> {
        let strings = store.strings();
        let names = |m: &Membership| -> Result<Vec<String>> {
            m.iter()
                .map(|wf| Ok(strings.component(wf)?.to_owned()))
                .collect()
        };

        let mut dump = Self::default();
        for (id, _, membership) in store.annotated_nodes() {
            dump.nodes.insert(store.describe_node(id)?, names(membership)?);
        }
        for (_, edge, membership) in store.annotated_edges() {
            dump.edges.push(EdgeMembership {
                source: store.describe_node(edge.source)?,
                target: store.describe_node(edge.target)?,
                scope: strings.component(edge.component)?.to_owned(),
                workflows: names(membership)?,
            });
        }
        log::debug!(
            "{} annotated nodes, {} annotated edges",
            dump.nodes.len(),
            dump.edges.len()
        );
        Ok(dump)
    }
}
