use anyhow::Result;
use colored::Colorize;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use graph::{ComponentId, GraphAccess};
use util::{HashMap, Hasher};

use crate::Error;

/// Order all workflows so that callers come before the workflows they call.
///
/// Ordering edges come from in-parameter to in-parameter data flows between two
/// different workflows. Ties are broken by component id string, so the order only
/// depends on the graph. Fails with [`Error::NotAcyclic`] if the workflows call
/// each other in a cycle.
pub fn schedule<G: GraphAccess>(graph: &G) -> Result<Vec<ComponentId>> {
    let workflows = graph.workflow_ids()?;
    let strings = graph.strings();

    let mut names = HashMap::with_capacity_and_hasher(workflows.len(), Hasher::default());
    let mut indegree = HashMap::with_capacity_and_hasher(workflows.len(), Hasher::default());
    let mut callees: HashMap<ComponentId, Vec<ComponentId>> =
        HashMap::with_capacity_and_hasher(workflows.len(), Hasher::default());
    for wf in &workflows {
        names.insert(*wf, strings.component(*wf)?);
        indegree.insert(*wf, 0usize);
    }

    for (caller, callee) in graph.ordering_edges()? {
        if caller == callee || !indegree.contains_key(&caller) {
            continue;
        }
        if let Some(n) = indegree.get_mut(&callee) {
            *n += 1;
            callees.entry(caller).or_default().push(callee);
        }
    }

    let mut ready: BinaryHeap<Reverse<(&str, ComponentId)>> = indegree
        .iter()
        .filter(|(_, n)| **n == 0)
        .map(|(wf, _)| Reverse((names[wf], *wf)))
        .collect();

    let mut order = Vec::with_capacity(workflows.len());
    while let Some(Reverse((name, wf))) = ready.pop() {
        log::debug!("scheduled {}", name.cyan());
        order.push(wf);
        for callee in callees.get(&wf).map(Vec::as_slice).unwrap_or_default() {
            if let Some(n) = indegree.get_mut(callee) {
                *n -= 1;
                if *n == 0 {
                    ready.push(Reverse((names[callee], *callee)));
                }
            }
        }
    }

    if order.len() < workflows.len() {
        let mut remaining: Vec<String> = indegree
            .iter()
            .filter(|(_, n)| **n > 0)
            .map(|(wf, _)| names[wf].to_owned())
            .collect();
        remaining.sort();
        return Err(Error::NotAcyclic(remaining).into());
    }
    Ok(order)
}
