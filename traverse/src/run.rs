use anyhow::Result;
use colored::Colorize;

use graph::{AccessError, ComponentId, Errors, GraphAccess, Recapper};

use crate::{
    propagate_control_memberships, walk, CancelToken, FlowClassifier, FlowPaths,
    MembershipAnnotator, RunContext, Visitor,
};

/// Annotate memberships by walking every workflow in `order`, then propagate
/// memberships onto control dependencies.
pub fn annotate_memberships<G: GraphAccess>(
    graph: &mut G,
    order: &[ComponentId],
    cancel: &CancelToken,
    errors: &mut Errors,
) -> Result<MembershipAnnotator> {
    let mut annotator = MembershipAnnotator::default();
    walk_roots(graph, &mut annotator, order, cancel, errors, "Annotating")?;
    propagate_control_memberships(graph)?;
    log::info!(
        "annotated {} nodes and {} edges",
        annotator.nodes_annotated,
        annotator.edges_annotated
    );
    Ok(annotator)
}

/// Classify the flows found by walking every workflow in `order`.
pub fn classify_flows<G: GraphAccess>(
    graph: &mut G,
    order: &[ComponentId],
    cancel: &CancelToken,
    errors: &mut Errors,
) -> Result<FlowPaths> {
    let mut classifier = FlowClassifier::default();
    walk_roots(graph, &mut classifier, order, cancel, errors, "Classifying")?;
    log::info!("found {} flow paths", classifier.paths.len());
    Ok(classifier.paths)
}

/// Walk each root in turn with one shared run context.
///
/// Accessor failures (e.g. retries exhausted) fail only the root they happened in:
/// they are recorded in `errors` and the next root is walked. Anything else aborts.
fn walk_roots<G: GraphAccess, V: Visitor>(
    graph: &mut G,
    visitor: &mut V,
    order: &[ComponentId],
    cancel: &CancelToken,
    errors: &mut Errors,
    label: &str,
) -> Result<()> {
    let mut run = RunContext::new(cancel.clone());
    for root in order {
        let name = graph.strings().component(*root)?.to_owned();
        log::info!("{label} {}", name.cyan());
        if let Err(e) = walk(graph, visitor, &mut run, errors, *root) {
            match e.downcast::<AccessError>() {
                Ok(access) => errors.add_context(
                    Recapper::new(access).into(),
                    format!("Failed to traverse workflow {name}"),
                ),
                Err(e) => return Err(e),
            }
        }
    }
    log::debug!("bookkeeping covers {} nodes", run.bookkeeping.len());
    Ok(())
}
