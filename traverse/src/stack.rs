use graph::{ComponentId, ComponentKind, StepId};

/// A component whose scope is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    pub component: ComponentId,
    pub kind: ComponentKind,
}

/// Active scopes, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentStack {
    scopes: Vec<Scope>,
}

/// Step instantiations entered and not yet consumed, outermost first.
pub type StepStack = Vec<StepId>;

impl ComponentStack {
    #[inline]
    pub fn push(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }

    #[inline]
    pub fn pop(&mut self) -> Option<Scope> {
        self.scopes.pop()
    }

    /// The innermost active scope.
    #[inline]
    pub fn top(&self) -> Option<Scope> {
        self.scopes.last().copied()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Component ids of all active scopes, outermost first.
    pub fn ids(&self) -> Vec<ComponentId> {
        self.scopes.iter().map(|s| s.component).collect()
    }

    /// Ids of the active scopes that are workflows, outermost first.
    pub fn workflows(&self) -> Vec<ComponentId> {
        self.scopes
            .iter()
            .filter(|s| s.kind.is_workflow())
            .map(|s| s.component)
            .collect()
    }
}

/// The last `n` items of `items`, or all of them if there are fewer.
#[inline]
pub fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_workflows_keep_order() {
        let scope = |i: usize, kind| Scope {
            component: ComponentId::from(i),
            kind,
        };
        let mut stack = ComponentStack::default();
        stack.push(scope(3, ComponentKind::Workflow));
        stack.push(scope(1, ComponentKind::Workflow));
        stack.push(scope(2, ComponentKind::Tool));
        assert_eq!(
            vec![ComponentId::from(3usize), ComponentId::from(1usize)],
            stack.workflows()
        );
        assert_eq!(3, stack.ids().len());
        assert_eq!(Some(scope(2, ComponentKind::Tool)), stack.pop());
        assert_eq!(Some(scope(1, ComponentKind::Workflow)), stack.top());
    }

    #[test]
    fn test_tail() {
        assert_eq!(&[2, 3], tail(&[1, 2, 3], 2));
        assert_eq!(&[1, 2, 3], tail(&[1, 2, 3], 5));
        assert!(tail::<u8>(&[], 1).is_empty());
    }
}
