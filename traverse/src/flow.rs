use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;

use graph::{ComponentId, GraphStrings, NodeId};

use crate::stack::tail;
use crate::{Bookkeeping, ComponentStack, StepStack, Visit, Visitor};

/// Classification of a path between two components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FlowType {
    /// From an enclosing workflow into one of its steps.
    Direct,
    /// From a step back out to an enclosing workflow.
    Indirect,
    /// Between two steps of the same workflow, one after the other.
    Sequential,
    /// Between two steps of the same workflow with others in between.
    Transitive,
}

/// One path from a source to a target component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathEntry {
    /// Workflow in whose context the path was found.
    pub context: ComponentId,
    pub flow: FlowType,
    /// Number of scope entries between source and target.
    pub distance: u32,
}

/// `paths[source][target]` lists every path found from source to target.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FlowPaths {
    paths: BTreeMap<ComponentId, BTreeMap<ComponentId, Vec<PathEntry>>>,
}

/// Serializable form of [`FlowPaths`] keyed by component id strings.
/// Entries serialize as `[context, flow_type, distance]`.
pub type RenderedPaths = BTreeMap<String, BTreeMap<String, Vec<(String, FlowType, u32)>>>;

impl FlowPaths {
    pub fn add(&mut self, source: ComponentId, target: ComponentId, entry: PathEntry) {
        self.paths
            .entry(source)
            .or_default()
            .entry(target)
            .or_default()
            .push(entry);
    }

    /// Paths from `source` to `target`, in the order they were found.
    pub fn get(&self, source: ComponentId, target: ComponentId) -> &[PathEntry] {
        self.paths
            .get(&source)
            .and_then(|targets| targets.get(&target))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterate (source, target, entries) in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, ComponentId, &[PathEntry])> {
        self.paths.iter().flat_map(|(source, targets)| {
            targets
                .iter()
                .map(move |(target, entries)| (*source, *target, entries.as_slice()))
        })
    }

    /// Total number of path entries.
    pub fn len(&self) -> usize {
        self.iter().map(|(_, _, entries)| entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn render(&self, strings: &GraphStrings) -> Result<RenderedPaths> {
        let mut rendered = RenderedPaths::new();
        for (source, target, entries) in self.iter() {
            let list = rendered
                .entry(strings.component(source)?.to_owned())
                .or_default()
                .entry(strings.component(target)?.to_owned())
                .or_default();
            for e in entries {
                list.push((strings.component(e.context)?.to_owned(), e.flow, e.distance));
            }
        }
        Ok(rendered)
    }
}

/// Per-branch classifier state.
#[derive(Debug, Clone, Default)]
pub struct FlowState {
    /// Incremented on every scope entry along this branch.
    depth: u32,
    /// Depth at which each component was last entered, in first-seen order.
    last_seen: Vec<(ComponentId, u32)>,
}

impl FlowState {
    fn set_last_seen(&mut self, component: ComponentId, depth: u32) {
        match self.last_seen.iter_mut().find(|(c, _)| *c == component) {
            Some((_, d)) => *d = depth,
            None => self.last_seen.push((component, depth)),
        }
    }

    fn last_seen(&self, component: ComponentId) -> Option<u32> {
        self.last_seen
            .iter()
            .find(|(c, _)| *c == component)
            .map(|(_, d)| *d)
    }
}

/// Classifies the paths a walk discovers into [`FlowType`]s.
#[derive(Debug, Default)]
pub struct FlowClassifier {
    pub paths: FlowPaths,
}

impl FlowClassifier {
    /// Sequential or transitive flows from earlier steps into `component`, for each
    /// enclosing workflow not already handled at this node with the same nested stacks.
    fn sequential_flows_to(
        &mut self,
        visit: &Visit<'_>,
        component: ComponentId,
        outer: &[ComponentId],
        state: &FlowState,
    ) {
        let contexts: Vec<(ComponentId, u32)> = outer
            .iter()
            .enumerate()
            .filter(|(i, _)| {
                !is_handled(visit.bookkeeping, visit.node, outer.len() - i, visit.stack, visit.steps)
            })
            .filter_map(|(_, ctx)| state.last_seen(*ctx).map(|at| (*ctx, at)))
            .collect();
        if contexts.is_empty() {
            return;
        }
        for (seen, seen_at) in &state.last_seen {
            if *seen == component || outer.contains(seen) {
                continue;
            }
            let distance = state.depth.saturating_sub(*seen_at);
            let flow = if distance == 1 {
                FlowType::Sequential
            } else {
                FlowType::Transitive
            };
            for (context, ctx_at) in &contexts {
                if *seen_at > *ctx_at {
                    self.paths.add(
                        *seen,
                        component,
                        PathEntry {
                            context: *context,
                            flow,
                            distance,
                        },
                    );
                }
            }
        }
    }

    /// Direct flows from each enclosing workflow into `component`, or indirect flows
    /// back out. Skips workflows under which this node was already handled with the
    /// same nested stacks.
    fn nesting_flows(
        &mut self,
        visit: &Visit<'_>,
        component: ComponentId,
        outer: &[ComponentId],
        flow: FlowType,
    ) {
        for (i, context) in outer.iter().enumerate() {
            if *context == component {
                continue;
            }
            if is_handled(visit.bookkeeping, visit.node, outer.len() - i, visit.stack, visit.steps)
            {
                continue;
            }
            let entry = PathEntry {
                context: *context,
                flow,
                distance: 1,
            };
            match flow {
                FlowType::Direct => self.paths.add(*context, component, entry),
                _ => self.paths.add(component, *context, entry),
            }
        }
    }
}

fn is_handled(
    bookkeeping: &Bookkeeping,
    node: NodeId,
    nesting: usize,
    stack: &ComponentStack,
    steps: &StepStack,
) -> bool {
    if !bookkeeping.contains(node) {
        return false;
    }
    let components = stack.ids();
    bookkeeping.is_subsumed(node, tail(&components, nesting), tail(steps, nesting))
}

impl Visitor for FlowClassifier {
    type State = FlowState;

    fn entered(&mut self, visit: &Visit<'_>, state: &mut FlowState) -> Result<()> {
        let component = visit.scope.component;
        state.set_last_seen(component, state.depth);
        let outer = visit.stack.workflows();
        self.sequential_flows_to(visit, component, &outer, state);
        self.nesting_flows(visit, component, &outer, FlowType::Direct);
        state.depth += 1;
        Ok(())
    }

    fn exited(&mut self, visit: &Visit<'_>, state: &mut FlowState) -> Result<()> {
        let component = visit.scope.component;
        let outer = visit.stack.workflows();
        self.nesting_flows(visit, component, &outer, FlowType::Indirect);
        if visit.scope.kind.is_workflow() {
            // an exited workflow sits at the depth of its last step
            state.set_last_seen(component, state.depth.saturating_sub(1));
        }
        Ok(())
    }
}
