use anyhow::Result;
use colored::Colorize;

use graph::{AccessError, ComponentId, Connection, Errors, GraphAccess, NodeId, NodeKind};

use crate::{Bookkeeping, CancelToken, ComponentStack, Error, Scope, StepStack};

/// What a visitor sees when a scope is entered or exited.
pub struct Visit<'a> {
    /// The in-parameter (on entry) or out-parameter (on exit) being handled.
    pub node: NodeId,
    /// The scope that was just pushed or popped.
    pub scope: Scope,
    /// Stack after the push or pop.
    pub stack: &'a ComponentStack,
    pub steps: &'a StepStack,
    /// Contexts recorded so far, before this visit is recorded.
    pub bookkeeping: &'a Bookkeeping,
}

/// Hooks called by [`walk`] as it moves through the graph.
pub trait Visitor {
    /// Per-branch state, copied into every branch that forks from this one.
    type State: Clone + Default;

    fn entered(&mut self, _visit: &Visit<'_>, _state: &mut Self::State) -> Result<()> {
        Ok(())
    }

    fn exited(&mut self, _visit: &Visit<'_>, _state: &mut Self::State) -> Result<()> {
        Ok(())
    }

    /// `node` is about to be expanded under `stack`.
    fn expanded<G: GraphAccess>(
        &mut self,
        _graph: &mut G,
        _node: NodeId,
        _stack: &ComponentStack,
    ) -> Result<()> {
        Ok(())
    }

    /// `conn` was selected as an outgoing edge under `stack`.
    fn followed<G: GraphAccess>(
        &mut self,
        _graph: &mut G,
        _conn: &Connection,
        _stack: &ComponentStack,
    ) -> Result<()> {
        Ok(())
    }
}

/// State shared by every walk in one run: the bookkeeping of expanded contexts,
/// and the cancellation flag.
pub struct RunContext {
    pub bookkeeping: Bookkeeping,
    pub cancel: CancelToken,
}

impl RunContext {
    pub fn new(cancel: CancelToken) -> Self {
        Self {
            bookkeeping: Bookkeeping::default(),
            cancel,
        }
    }
}

struct Branch<S> {
    node: NodeId,
    stack: ComponentStack,
    steps: StepStack,
    state: S,
}

/// Depth-first walk from every in-parameter of `root`, tracking which component
/// scopes and step instantiations are active along each path.
///
/// Missing nodes are reported as warnings and end their branch. A scope mismatch
/// and cancellation are fatal. Other accessor errors are returned as-is.
pub fn walk<G: GraphAccess, V: Visitor>(
    graph: &mut G,
    visitor: &mut V,
    run: &mut RunContext,
    errors: &mut Errors,
    root: ComponentId,
) -> Result<()> {
    let mut work: Vec<Branch<V::State>> = graph
        .in_parameters(root)?
        .into_iter()
        .rev()
        .map(|node| Branch {
            node,
            stack: ComponentStack::default(),
            steps: StepStack::new(),
            state: V::State::default(),
        })
        .collect();

    while let Some(branch) = work.pop() {
        run.cancel.check()?;
        expand(graph, visitor, run, errors, branch, &mut work)?;
    }
    Ok(())
}

fn expand<G: GraphAccess, V: Visitor>(
    graph: &mut G,
    visitor: &mut V,
    run: &mut RunContext,
    errors: &mut Errors,
    branch: Branch<V::State>,
    work: &mut Vec<Branch<V::State>>,
) -> Result<()> {
    let Branch {
        node,
        mut stack,
        mut steps,
        mut state,
    } = branch;

    let Some(details) = skip_missing(graph.node(node), errors)? else {
        return Ok(());
    };

    match details.kind {
        NodeKind::InParameter if stack.top().map(|s| s.component) != Some(details.component) => {
            let scope = Scope {
                component: details.component,
                kind: details.component_kind,
            };
            stack.push(scope);
            log::trace!(
                "entering {}",
                graph.strings().component(details.component)?.cyan()
            );
            let visit = Visit {
                node,
                scope,
                stack: &stack,
                steps: &steps,
                bookkeeping: &run.bookkeeping,
            };
            visitor.entered(&visit, &mut state)?;
        }
        NodeKind::OutParameter => {
            if let Some(top) = stack.top() {
                if top.component != details.component {
                    let strings = graph.strings();
                    return Err(Error::ScopeMismatch(
                        strings.component(details.component)?.to_owned(),
                        strings.component(top.component)?.to_owned(),
                    )
                    .into());
                }
                stack.pop();
                log::trace!("exiting {}", graph.strings().component(top.component)?.cyan());
                let visit = Visit {
                    node,
                    scope: top,
                    stack: &stack,
                    steps: &steps,
                    bookkeeping: &run.bookkeeping,
                };
                visitor.exited(&visit, &mut state)?;
            }
        }
        _ => {}
    }

    let Some(top) = stack.top() else {
        return Ok(());
    };

    if !run.bookkeeping.record(node, &stack.ids(), &steps) {
        return Ok(());
    }
    visitor.expanded(graph, node, &stack)?;

    // mid-step, the innermost step disambiguates which of the workflow's edges apply:
    let step = if top.kind.is_workflow() && details.kind != NodeKind::InParameter {
        steps.pop()
    } else {
        None
    };
    let Some(connections) = skip_missing(graph.connections(node, top.component, step), errors)?
    else {
        return Ok(());
    };

    for conn in connections.iter().rev() {
        visitor.followed(graph, conn, &stack)?;
        let mut next_steps = steps.clone();
        if let Some(step) = conn.step {
            next_steps.push(step);
        }
        work.push(Branch {
            node: conn.target,
            stack: stack.clone(),
            steps: next_steps,
            state: state.clone(),
        });
    }
    Ok(())
}

/// Turn not-found errors into a warning and `None`; pass other errors through.
fn skip_missing<T>(res: Result<T, AccessError>, errors: &mut Errors) -> Result<Option<T>> {
    match res {
        Ok(val) => Ok(Some(val)),
        Err(e) if e.is_not_found() => {
            errors.warn(format!("{e}; skipping branch"));
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
