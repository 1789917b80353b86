use graph::{ComponentId, NodeId, StepId};
use util::{HashMap, Hasher};

/// True if `inner` is a suffix of `outer`. The empty sequence is a suffix of everything.
pub fn is_suffix<T: PartialEq>(inner: &[T], outer: &[T]) -> bool {
    inner.len() <= outer.len() && outer[outer.len() - inner.len()..] == *inner
}

/// Stack snapshots under which each node has already been expanded.
///
/// A context is subsumed when its component stack is a suffix of a recorded
/// component stack and its step stack is a suffix of the step stack recorded
/// alongside it: everything reachable from the subsumed context has already
/// been reached from the recorded one.
#[derive(Debug)]
pub struct Bookkeeping {
    seen: HashMap<NodeId, Vec<(Vec<ComponentId>, Vec<StepId>)>>,
}

impl Default for Bookkeeping {
    fn default() -> Self {
        Self {
            seen: HashMap::with_capacity_and_hasher(256, Hasher::default()),
        }
    }
}

impl Bookkeeping {
    /// True if `node` has been expanded under any context.
    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        self.seen.contains_key(&node)
    }

    pub fn is_subsumed(&self, node: NodeId, components: &[ComponentId], steps: &[StepId]) -> bool {
        match self.seen.get(&node) {
            Some(contexts) => contexts
                .iter()
                .any(|(cs, ss)| is_suffix(components, cs) && is_suffix(steps, ss)),
            None => false,
        }
    }

    /// Record the context unless it is subsumed. Returns false if it was subsumed.
    pub fn record(&mut self, node: NodeId, components: &[ComponentId], steps: &[StepId]) -> bool {
        if self.is_subsumed(node, components, steps) {
            return false;
        }
        self.seen
            .entry(node)
            .or_insert_with(|| Vec::with_capacity(2))
            .push((components.to_vec(), steps.to_vec()));
        true
    }

    /// Number of nodes with at least one recorded context.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
