use std::collections::BTreeSet;

use crate::ComponentId;

/// Set of outer workflows whose execution context was active when a node
/// or edge was visited. Only ever grows.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Membership {
    workflows: BTreeSet<ComponentId>,
}

impl Membership {
    /// Add all of `workflows`; returns true if anything was new.
    pub fn union(&mut self, workflows: &[ComponentId]) -> bool {
        let mut changed = false;
        for wf in workflows {
            changed |= self.workflows.insert(*wf);
        }
        changed
    }

    pub fn union_with(&mut self, other: &Membership) -> bool {
        let before = self.workflows.len();
        self.workflows.extend(other.workflows.iter().copied());
        self.workflows.len() != before
    }

    #[inline]
    pub fn contains(&self, wf: ComponentId) -> bool {
        self.workflows.contains(&wf)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.workflows.iter().copied()
    }
}
