//! Greedy overlap-layout-consensus assembly of DNA fragments.
//!
//! The crate reconstructs a source sequence from overlapping reads using exact
//! suffix/prefix overlaps: an [`OverlapGraph`] holds the live fragments and
//! their edges, a [`GreedyAssembler`] repeatedly merges the heaviest edge, and
//! an [`OrientationSelector`] commits double-stranded reads to one strand
//! beforehand. Fragment loading and synthetic data generation live in
//! [`reader`] and [`generator`].

pub mod assembler;
pub mod config;
pub mod events;
pub mod fragment;
pub mod generator;
pub mod graph;
pub mod orientation;
pub mod overlap;
pub mod reader;

pub use assembler::{best_overlap, AssemblyError, GreedyAssembler};
pub use config::AssemblyConfig;
pub use events::{AssemblyObserver, LogObserver, NoopObserver, RecordingObserver};
pub use fragment::{reverse_complement, Fragment, FragmentError, ValidationMode};
pub use generator::{FragmentGenerator, GeneratorConfig, GeneratorError, SyntheticRun};
pub use graph::{FragmentId, GraphError, GraphExport, OverlapGraph};
pub use orientation::{Orientation, OrientationChoice, OrientationSelector, SelectionMode};
pub use overlap::{suffix_prefix_overlap, Overlap, OverlapConfig};
pub use reader::{read_fragments, ReaderError, SequenceFormat};

/// Errors from a complete orient-build-assemble run.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Fragment(#[from] FragmentError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

/// Orient (when `mode` is set) and build the overlap graph that will be assembled.
pub fn prepare_graph(
    fragments: &[Fragment],
    mode: Option<SelectionMode>,
    config: AssemblyConfig,
    observer: &mut dyn AssemblyObserver,
) -> Result<OverlapGraph, PipelineError> {
    let oriented = match mode {
        Some(mode) => OrientationSelector::new(config).select_observed(fragments, mode, observer)?,
        None => fragments.to_vec(),
    };
    Ok(OverlapGraph::build(oriented, config.overlap)?)
}

/// Orient (when `mode` is set), build the graph and assemble in one call.
pub fn assemble_fragments(
    fragments: &[Fragment],
    mode: Option<SelectionMode>,
    config: AssemblyConfig,
    observer: &mut dyn AssemblyObserver,
) -> Result<Fragment, PipelineError> {
    let graph = prepare_graph(fragments, mode, config, &mut *observer)?;
    Ok(GreedyAssembler::new().assemble_observed(graph, observer)?)
}
