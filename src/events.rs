//! Structured events emitted by the assembler and the orientation selector.
//!
//! The core never prints. Callers that want progress output, counters or
//! traces implement [`AssemblyObserver`]; [`LogObserver`] forwards everything
//! to the `log` facade and is what the plain entry points use.

use crate::fragment::Fragment;
use crate::orientation::OrientationChoice;

/// One candidate edge inspected while searching for the best merge.
#[derive(Debug, Clone, Copy)]
pub struct EdgeConsidered<'a> {
    /// Merge step, starting at 1.
    pub step: usize,
    pub source: &'a Fragment,
    pub target: &'a Fragment,
    pub length: usize,
}

/// A completed merge.
#[derive(Debug, Clone, Copy)]
pub struct FragmentMerged<'a> {
    pub step: usize,
    pub source_id: &'a str,
    pub target_id: &'a str,
    pub overlap: usize,
    pub merged: &'a Fragment,
    /// Fragments left in the graph after this merge.
    pub remaining: usize,
}

/// Receiver for core events. Every method defaults to a no-op.
pub trait AssemblyObserver {
    fn edge_considered(&mut self, _event: &EdgeConsidered<'_>) {}

    fn fragment_merged(&mut self, _event: &FragmentMerged<'_>) {}

    fn orientation_chosen(&mut self, _choice: &OrientationChoice) {}
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl AssemblyObserver for NoopObserver {}

/// Routes events to `log` (`trace` for edges, `debug` for decisions).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl AssemblyObserver for LogObserver {
    fn edge_considered(&mut self, event: &EdgeConsidered<'_>) {
        log::trace!(
            "[step {}] edge {} -> {} (overlap {})",
            event.step,
            event.source.id(),
            event.target.id(),
            event.length
        );
    }

    fn fragment_merged(&mut self, event: &FragmentMerged<'_>) {
        log::debug!(
            "[step {}] merged {} + {} (overlap {}) into {} ({} bp, {} fragments left)",
            event.step,
            event.source_id,
            event.target_id,
            event.overlap,
            event.merged.id(),
            event.merged.len(),
            event.remaining
        );
    }

    fn orientation_chosen(&mut self, choice: &OrientationChoice) {
        log::debug!(
            "Orientation for {}: {:?} (forward score {}, reverse score {})",
            choice.fragment_id,
            choice.orientation,
            choice.forward_score,
            choice.reverse_score
        );
    }
}

/// Keeps every event it receives; handy for inspecting a run after the fact.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub edges_considered: usize,
    /// `(source id, target id, overlap, merged id)` per merge, in order.
    pub merges: Vec<(String, String, usize, String)>,
    pub orientations: Vec<OrientationChoice>,
}

impl AssemblyObserver for RecordingObserver {
    fn edge_considered(&mut self, _event: &EdgeConsidered<'_>) {
        self.edges_considered += 1;
    }

    fn fragment_merged(&mut self, event: &FragmentMerged<'_>) {
        self.merges.push((
            event.source_id.to_string(),
            event.target_id.to_string(),
            event.overlap,
            event.merged.id().to_string(),
        ));
    }

    fn orientation_chosen(&mut self, choice: &OrientationChoice) {
        self.orientations.push(choice.clone());
    }
}
