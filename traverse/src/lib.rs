//!
//! The functions in this mod walk the component graph from the entry parameters of
//! each workflow, keeping track of which component scopes and step instantiations
//! are active along every path.
//!
//! A run happens in up to 3 steps:
//! 1. [`schedule`] orders the workflows so that callers are walked before callees.
//! 2. [`annotate_memberships`] records, on every node and edge reached, the workflows
//!    whose scope was active, then carries those memberships over to control dependencies.
//! 3. [`classify_flows`] walks the same way and records typed [`FlowPaths`] between components.
//!
//! Both walks share the same skeleton ([`walk`]), parameterized by a [`Visitor`].
//! Revisits are cut short by [`Bookkeeping`]: a node reached under a stack context that
//! is a suffix of one it was already expanded under has nothing new to contribute.

/// component and step stacks
mod stack;
pub use stack::{ComponentStack, Scope, StepStack};

/// record of contexts each node has been expanded under
mod bookkeeping;
pub use bookkeeping::{is_suffix, Bookkeeping};

mod cancel;
pub use cancel::CancelToken;

/// topological order of workflows
mod scheduler;
pub use scheduler::schedule;

/// shared depth-first skeleton
mod walk;
pub use walk::{walk, RunContext, Visit, Visitor};

mod annotate;
pub use annotate::{propagate_control_memberships, MembershipAnnotator};

mod flow;
pub use flow::{FlowClassifier, FlowPaths, FlowType, PathEntry, RenderedPaths};

mod run;
pub use run::{annotate_memberships, classify_flows};

#[cfg(test)]
mod fixture;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Scope mismatch: exiting {0}, but the innermost active scope is {1}")]
    ScopeMismatch(String, String),
    #[error("Dependency graph is not acyclic; unresolved workflows: {}", .0.join(", "))]
    NotAcyclic(Vec<String>),
    #[error("Traversal cancelled")]
    Cancelled,
}
