use std::str::FromStr;
use std::time::Duration;

use crate::{
    AccessError, ComponentId, ComponentKind, Connection, ControlEdge, EdgeId, GraphAccess,
    GraphStrings, Membership, NodeDetails, NodeId, StepId,
};

/// How the delay grows between retries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backoff {
    #[default]
    Fixed,
    Linear,
    Exponential,
}

impl FromStr for Backoff {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed" => Ok(Self::Fixed),
            "linear" => Ok(Self::Linear),
            "exponential" => Ok(Self::Exponential),
            _ => Err(crate::Error::UnknownBackoff(s.to_owned())),
        }
    }
}

/// Bounded retry for transient accessor errors.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first one. At least 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            backoff: Backoff::Exponential,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay;
        match self.backoff {
            Backoff::Fixed => base,
            Backoff::Linear => base.saturating_mul(attempt),
            Backoff::Exponential => {
                let shift = attempt.saturating_sub(1).min(20);
                base.saturating_mul(1u32 << shift)
            }
        }
    }

    fn run<T>(
        &self,
        what: &str,
        mut f: impl FnMut() -> Result<T, AccessError>,
    ) -> Result<T, AccessError> {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match f() {
                Ok(val) => return Ok(val),
                Err(e) if e.is_transient() => {
                    if attempt >= max_attempts {
                        return Err(AccessError::RetriesExhausted(attempt, e.to_string()));
                    }
                    let delay = self.delay(attempt);
                    log::warn!(
                        "{what} failed (attempt {attempt}/{max_attempts}): {e}; retrying in {delay:?}"
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Wraps a graph accessor and retries transient failures according to a [`RetryPolicy`].
/// Non-transient errors pass through untouched.
pub struct Retrying<G> {
    inner: G,
    policy: RetryPolicy,
}

impl<G: GraphAccess> Retrying<G> {
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    pub fn into_inner(self) -> G {
        self.inner
    }
}

impl<G: GraphAccess> GraphAccess for Retrying<G> {
    fn strings(&self) -> &GraphStrings {
        self.inner.strings()
    }

    fn workflow_ids(&self) -> Result<Vec<ComponentId>, AccessError> {
        self.policy.run("fetch workflows", || self.inner.workflow_ids())
    }

    fn component_ids(&self) -> Result<Vec<ComponentId>, AccessError> {
        self.policy.run("fetch components", || self.inner.component_ids())
    }

    fn component_kind(&self, component: ComponentId) -> Result<ComponentKind, AccessError> {
        self.policy
            .run("fetch component kind", || self.inner.component_kind(component))
    }

    fn in_parameters(&self, component: ComponentId) -> Result<Vec<NodeId>, AccessError> {
        self.policy
            .run("fetch in-parameters", || self.inner.in_parameters(component))
    }

    fn out_parameters(&self, component: ComponentId) -> Result<Vec<NodeId>, AccessError> {
        self.policy
            .run("fetch out-parameters", || self.inner.out_parameters(component))
    }

    fn node(&self, node: NodeId) -> Result<NodeDetails, AccessError> {
        self.policy.run("fetch node", || self.inner.node(node))
    }

    fn connections(
        &self,
        node: NodeId,
        scope: ComponentId,
        step: Option<StepId>,
    ) -> Result<Vec<Connection>, AccessError> {
        self.policy
            .run("fetch connections", || self.inner.connections(node, scope, step))
    }

    fn ordering_edges(&self) -> Result<Vec<(ComponentId, ComponentId)>, AccessError> {
        self.policy
            .run("fetch ordering edges", || self.inner.ordering_edges())
    }

    fn control_edges(&self) -> Result<Vec<ControlEdge>, AccessError> {
        self.policy
            .run("fetch control edges", || self.inner.control_edges())
    }

    fn node_membership(&self, node: NodeId) -> Result<Membership, AccessError> {
        self.policy
            .run("fetch node membership", || self.inner.node_membership(node))
    }

    fn edge_membership(&self, edge: EdgeId) -> Result<Membership, AccessError> {
        self.policy
            .run("fetch edge membership", || self.inner.edge_membership(edge))
    }

    fn annotate_node(
        &mut self,
        node: NodeId,
        workflows: &[ComponentId],
    ) -> Result<(), AccessError> {
        let inner = &mut self.inner;
        self.policy
            .run("annotate node", || inner.annotate_node(node, workflows))
    }

    fn annotate_edge(
        &mut self,
        edge: EdgeId,
        workflows: &[ComponentId],
    ) -> Result<(), AccessError> {
        let inner = &mut self.inner;
        self.policy
            .run("annotate edge", || inner.annotate_edge(edge, workflows))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Direction, GraphStore};
    use anyhow::Result;
    use std::cell::Cell;

    /// Fails the first `failures` read requests with a transient error.
    struct Flaky {
        store: GraphStore,
        failures: Cell<u32>,
        calls: Cell<u32>,
    }

    impl Flaky {
        fn trip(&self) -> Result<(), AccessError> {
            self.calls.set(self.calls.get() + 1);
            if self.failures.get() > 0 {
                self.failures.set(self.failures.get() - 1);
                return Err(AccessError::Unavailable("connection reset".into()));
            }
            Ok(())
        }
    }

    impl GraphAccess for Flaky {
        fn strings(&self) -> &GraphStrings {
            self.store.strings()
        }
        fn workflow_ids(&self) -> Result<Vec<ComponentId>, AccessError> {
            self.trip()?;
            self.store.workflow_ids()
        }
        fn component_ids(&self) -> Result<Vec<ComponentId>, AccessError> {
            self.store.component_ids()
        }
        fn component_kind(&self, c: ComponentId) -> Result<ComponentKind, AccessError> {
            self.store.component_kind(c)
        }
        fn in_parameters(&self, c: ComponentId) -> Result<Vec<NodeId>, AccessError> {
            self.trip()?;
            self.store.in_parameters(c)
        }
        fn out_parameters(&self, c: ComponentId) -> Result<Vec<NodeId>, AccessError> {
            self.store.out_parameters(c)
        }
        fn node(&self, n: NodeId) -> Result<NodeDetails, AccessError> {
            self.store.node(n)
        }
        fn connections(
            &self,
            n: NodeId,
            scope: ComponentId,
            step: Option<StepId>,
        ) -> Result<Vec<Connection>, AccessError> {
            self.store.connections(n, scope, step)
        }
        fn ordering_edges(&self) -> Result<Vec<(ComponentId, ComponentId)>, AccessError> {
            self.store.ordering_edges()
        }
        fn control_edges(&self) -> Result<Vec<ControlEdge>, AccessError> {
            self.store.control_edges()
        }
        fn node_membership(&self, n: NodeId) -> Result<Membership, AccessError> {
            self.store.node_membership(n)
        }
        fn edge_membership(&self, e: EdgeId) -> Result<Membership, AccessError> {
            self.store.edge_membership(e)
        }
        fn annotate_node(&mut self, n: NodeId, wfs: &[ComponentId]) -> Result<(), AccessError> {
            self.store.annotate_node(n, wfs)
        }
        fn annotate_edge(&mut self, e: EdgeId, wfs: &[ComponentId]) -> Result<(), AccessError> {
            self.store.annotate_edge(e, wfs)
        }
    }

    fn flaky(failures: u32) -> Result<Flaky> {
        let mut store = GraphStore::default();
        store.add_component("p/wf.cwl", ComponentKind::Workflow)?;
        store.add_parameter("p/wf.cwl", "x", Direction::In, None)?;
        Ok(Flaky {
            store,
            failures: Cell::new(failures),
            calls: Cell::new(0),
        })
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
            backoff: Backoff::Fixed,
        }
    }

    #[test]
    fn test_transient_failures_are_retried() -> Result<()> {
        let g = Retrying::new(flaky(2)?, policy(3));
        assert_eq!(1, g.workflow_ids()?.len());
        assert_eq!(3, g.inner().calls.get());
        Ok(())
    }

    #[test]
    fn test_exhaustion_is_reported() -> Result<()> {
        let g = Retrying::new(flaky(5)?, policy(3));
        let wf = g.inner().store.find_component("p/wf.cwl").unwrap();
        match g.in_parameters(wf) {
            Err(AccessError::RetriesExhausted(3, _)) => {}
            other => panic!("expected exhausted retries, got {other:?}"),
        }
        assert_eq!(3, g.inner().calls.get());
        Ok(())
    }

    #[test]
    fn test_not_found_is_not_retried() -> Result<()> {
        let g = Retrying::new(flaky(0)?, policy(3));
        let err = g.node(NodeId::from(42usize)).unwrap_err();
        assert!(err.is_not_found());
        Ok(())
    }

    #[test]
    fn test_backoff_delays() {
        let base = Duration::from_millis(10);
        let mut p = RetryPolicy {
            max_attempts: 4,
            base_delay: base,
            backoff: Backoff::Fixed,
        };
        assert_eq!(base, p.delay(3));
        p.backoff = Backoff::Linear;
        assert_eq!(base * 3, p.delay(3));
        p.backoff = Backoff::Exponential;
        assert_eq!(base, p.delay(1));
        assert_eq!(base * 4, p.delay(3));
        assert_eq!("linear".parse::<Backoff>().unwrap(), Backoff::Linear);
        assert!("sometimes".parse::<Backoff>().is_err());
    }
}
