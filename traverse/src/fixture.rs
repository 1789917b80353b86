//! Small graphs shared by the traversal tests.

use anyhow::Result;

use graph::{ComponentId, ComponentKind, Direction, EdgeId, GraphStore, NodeId};

pub struct Fixture {
    pub store: GraphStore,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            store: GraphStore::default(),
        }
    }

    pub fn workflow(&mut self, id: &str) -> Result<ComponentId> {
        self.store.add_component(id, ComponentKind::Workflow)
    }

    pub fn tool(&mut self, id: &str) -> Result<ComponentId> {
        self.store.add_component(id, ComponentKind::Tool)
    }

    pub fn input(&mut self, component: &str, id: &str) -> Result<NodeId> {
        self.store.add_parameter(component, id, Direction::In, None)
    }

    pub fn output(&mut self, component: &str, id: &str) -> Result<NodeId> {
        self.store.add_parameter(component, id, Direction::Out, None)
    }

    pub fn flow(
        &mut self,
        source: NodeId,
        target: NodeId,
        scope: &str,
        step: Option<&str>,
        data: &str,
    ) -> Result<EdgeId> {
        self.store.add_data_flow(source, target, scope, step, data)
    }

    pub fn id(&self, component: &str) -> ComponentId {
        self.store.find_component(component).unwrap()
    }

    /// Tool `id` with input "a" wired straight through to output "b".
    pub fn passthrough_tool(&mut self, id: &str) -> Result<(NodeId, NodeId)> {
        self.tool(id)?;
        let a = self.input(id, "a")?;
        let b = self.output(id, "b")?;
        self.flow(a, b, id, None, "a")?;
        Ok((a, b))
    }

    /// Workflow `wf` with input "x" and output "y" running `tools` as steps "s1", "s2", ...
    /// in sequence, each step consuming the previous step's output.
    pub fn sequence(&mut self, wf: &str, tools: &[&str]) -> Result<(NodeId, NodeId)> {
        self.workflow(wf)?;
        let x = self.input(wf, "x")?;
        let y = self.output(wf, "y")?;

        let mut prev: Option<(NodeId, String)> = None;
        for (i, tool) in tools.iter().enumerate() {
            let step = format!("s{}", i + 1);
            let (a, b) = match self.store.find_parameter(tool, "a", Direction::In) {
                Some(a) => (a, self.store.find_parameter(tool, "b", Direction::Out).unwrap()),
                None => self.passthrough_tool(tool)?,
            };
            match &prev {
                None => self.flow(x, a, wf, Some(&step), "x")?,
                Some((prev_b, prev_step)) => {
                    self.flow(*prev_b, a, wf, Some(&step), &format!("{prev_step}/b"))?
                }
            };
            prev = Some((b, step));
        }
        if let Some((b, step)) = prev {
            self.flow(b, y, wf, None, &format!("{step}/b"))?;
        }
        Ok((x, y))
    }

    /// Workflow `outer` running workflow `inner` as its single step "inner".
    pub fn wrap(&mut self, outer: &str, inner: &str) -> Result<(NodeId, NodeId)> {
        self.workflow(outer)?;
        let x = self.input(outer, "x")?;
        let y = self.output(outer, "y")?;
        let inner_x = self.store.find_parameter(inner, "x", Direction::In).unwrap();
        let inner_y = self.store.find_parameter(inner, "y", Direction::Out).unwrap();
        self.flow(x, inner_x, outer, Some("inner"), "x")?;
        self.flow(inner_y, y, outer, None, "inner/y")?;
        Ok((x, y))
    }
}
