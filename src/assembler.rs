//! Greedy merge loop collapsing an overlap graph to a single fragment.

use crate::events::{AssemblyObserver, EdgeConsidered, FragmentMerged, LogObserver};
use crate::fragment::Fragment;
use crate::graph::{GraphError, OverlapGraph};
use crate::overlap::Overlap;

/// Errors that end an assembly run. No partial result is ever returned.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("cannot assemble an empty fragment set")]
    EmptyGraph,
    #[error(
        "assembly stuck: {} fragments remain with no overlaps between them ({})",
        .remaining.len(),
        .remaining.join(", ")
    )]
    Stuck {
        /// Ids of every fragment left in the graph, sorted.
        remaining: Vec<String>,
    },
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Repeatedly merges the heaviest edge until one fragment remains.
///
/// Ties on overlap length go to the edge whose `(source id, target id)` pair
/// sorts first, so the result does not depend on input order.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyAssembler;

impl GreedyAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Assemble `graph`, reporting progress through [`LogObserver`].
    pub fn assemble(&self, graph: OverlapGraph) -> Result<Fragment, AssemblyError> {
        self.assemble_observed(graph, &mut LogObserver)
    }

    /// Assemble `graph`, reporting every inspected edge and merge to `observer`.
    pub fn assemble_observed(
        &self,
        mut graph: OverlapGraph,
        observer: &mut dyn AssemblyObserver,
    ) -> Result<Fragment, AssemblyError> {
        if graph.is_empty() {
            return Err(AssemblyError::EmptyGraph);
        }

        let initial = graph.len();
        let mut step = 0;
        while graph.len() > 1 {
            step += 1;
            let before = graph.len();

            let Some(best) = select_best_overlap(&graph, step, observer) else {
                let mut remaining: Vec<String> = graph
                    .fragments()
                    .map(|(_, fragment)| fragment.id().to_string())
                    .collect();
                remaining.sort();
                log::debug!(
                    "No overlaps left after {} merges; {} fragments remain",
                    step - 1,
                    remaining.len()
                );
                return Err(AssemblyError::Stuck { remaining });
            };

            let source_id = fragment_id(&graph, best.source)?;
            let target_id = fragment_id(&graph, best.target)?;
            let merged = graph.merge_and_replace(best.source, best.target, best.length)?;
            observer.fragment_merged(&FragmentMerged {
                step,
                source_id: &source_id,
                target_id: &target_id,
                overlap: best.length,
                merged,
                remaining: before - 1,
            });
        }

        let last = graph
            .fragments()
            .next()
            .map(|(id, _)| id)
            .ok_or(AssemblyError::EmptyGraph)?;
        let assembled = graph.remove_fragment(last)?;
        log::info!(
            "Assembled {} fragments in {} merges into {} ({} bp)",
            initial,
            step,
            assembled.id(),
            assembled.len()
        );
        Ok(assembled)
    }
}

/// The heaviest edge of `graph`, ties broken by `(source id, target id)`.
pub fn best_overlap(graph: &OverlapGraph) -> Option<Overlap> {
    select_best_overlap(graph, 0, &mut crate::events::NoopObserver)
}

fn select_best_overlap(
    graph: &OverlapGraph,
    step: usize,
    observer: &mut dyn AssemblyObserver,
) -> Option<Overlap> {
    let mut best: Option<(Overlap, &str, &str)> = None;

    for edge in graph.edges() {
        let (Some(source), Some(target)) =
            (graph.fragment(edge.source), graph.fragment(edge.target))
        else {
            continue;
        };
        observer.edge_considered(&EdgeConsidered {
            step,
            source,
            target,
            length: edge.length,
        });

        let better = match best {
            None => true,
            Some((current, source_id, target_id)) => {
                edge.length > current.length
                    || (edge.length == current.length
                        && (source.id(), target.id()) < (source_id, target_id))
            }
        };
        if better {
            best = Some((edge, source.id(), target.id()));
        }
    }

    best.map(|(edge, _, _)| edge)
}

fn fragment_id(graph: &OverlapGraph, id: crate::graph::FragmentId) -> Result<String, GraphError> {
    graph
        .fragment(id)
        .map(|fragment| fragment.id().to_string())
        .ok_or(GraphError::UnknownFragment(id))
}
