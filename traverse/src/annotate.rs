use anyhow::Result;

use graph::{Connection, GraphAccess, Membership, NodeId};

use crate::{ComponentStack, Visitor};

/// Records, on every node expanded and every edge followed, the workflows
/// whose scope was active at the time.
#[derive(Debug, Default)]
pub struct MembershipAnnotator {
    pub nodes_annotated: usize,
    pub edges_annotated: usize,
}

impl Visitor for MembershipAnnotator {
    type State = ();

    fn expanded<G: GraphAccess>(
        &mut self,
        graph: &mut G,
        node: NodeId,
        stack: &ComponentStack,
    ) -> Result<()> {
        graph.annotate_node(node, &stack.workflows())?;
        self.nodes_annotated += 1;
        Ok(())
    }

    fn followed<G: GraphAccess>(
        &mut self,
        graph: &mut G,
        conn: &Connection,
        stack: &ComponentStack,
    ) -> Result<()> {
        graph.annotate_edge(conn.edge, &stack.workflows())?;
        self.edges_annotated += 1;
        Ok(())
    }
}

/// Give each control-dependency edge the memberships of the data flows leaving
/// its target in the same scope. Returns the number of edges that gained members.
pub fn propagate_control_memberships<G: GraphAccess>(graph: &mut G) -> Result<usize> {
    let mut updated = 0;
    for ctrl in graph.control_edges()? {
        let mut membership = Membership::default();
        for conn in graph.connections(ctrl.target, ctrl.component, None)? {
            membership.union_with(&graph.edge_membership(conn.edge)?);
        }
        if membership.is_empty() {
            continue;
        }
        let before = graph.edge_membership(ctrl.edge)?;
        let workflows: Vec<_> = membership.iter().collect();
        graph.annotate_edge(ctrl.edge, &workflows)?;
        if graph.edge_membership(ctrl.edge)? != before {
            updated += 1;
        }
    }
    log::debug!("propagated memberships to {updated} control dependencies");
    Ok(updated)
}
