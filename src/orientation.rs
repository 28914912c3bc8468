//! Strand orientation selection for double-stranded fragment sets.
//!
//! Each fragment may have been read from either strand. Before the overlap
//! graph is built, the selector commits every fragment to one orientation by
//! comparing the bidirectional overlap score of the fragment and of its
//! reverse-complement against fragments that are already oriented.
//!
//! Two strategies are offered. [`SelectionMode::Local`] walks the input once
//! in order and keeps that order. [`SelectionMode::Global`] first picks the
//! best-connected fragment as an anchor and then grows the layout by always
//! appending the best remaining (fragment, orientation) pair.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::config::AssemblyConfig;
use crate::events::{AssemblyObserver, LogObserver};
use crate::fragment::{Fragment, FragmentError, ValidationMode, REVCOMP_SUFFIX};
use crate::overlap::OverlapConfig;

/// Strand of a fragment relative to how it was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    Forward,
    ReverseComplement,
}

/// Orientation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SelectionMode {
    /// Sequential decisions in input order.
    #[default]
    Local,
    /// Anchor-first greedy layout; output is reordered.
    Global,
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Global => f.write_str("global"),
        }
    }
}

impl FromStr for SelectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "global" => Ok(Self::Global),
            other => Err(format!("unknown orientation mode {other:?} (expected local or global)")),
        }
    }
}

/// One committed orientation decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrientationChoice {
    /// Id of the input fragment the decision is about.
    pub fragment_id: String,
    pub orientation: Orientation,
    pub forward_score: usize,
    pub reverse_score: usize,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: usize,
    orientation: Orientation,
    score: usize,
    forward_score: usize,
    reverse_score: usize,
}

/// Keep the first strictly better candidate, testing forward before reverse.
fn consider(
    best: &mut Option<Candidate>,
    index: usize,
    forward_score: usize,
    reverse_score: usize,
) {
    for (orientation, score) in [
        (Orientation::Forward, forward_score),
        (Orientation::ReverseComplement, reverse_score),
    ] {
        if best.map_or(true, |current| score > current.score) {
            *best = Some(Candidate {
                index,
                orientation,
                score,
                forward_score,
                reverse_score,
            });
        }
    }
}

/// Chooses a strand for every fragment ahead of assembly.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrientationSelector {
    overlap: OverlapConfig,
    validation: ValidationMode,
}

impl OrientationSelector {
    pub fn new(config: AssemblyConfig) -> Self {
        Self {
            overlap: config.overlap,
            validation: config.validation,
        }
    }

    /// Orient `fragments` with `mode`, logging each decision.
    pub fn select(
        &self,
        fragments: &[Fragment],
        mode: SelectionMode,
    ) -> Result<Vec<Fragment>, FragmentError> {
        self.select_observed(fragments, mode, &mut LogObserver)
    }

    /// Orient `fragments` with `mode`, reporting each decision to `observer`.
    ///
    /// The output has exactly one entry per input fragment.
    pub fn select_observed(
        &self,
        fragments: &[Fragment],
        mode: SelectionMode,
        observer: &mut dyn AssemblyObserver,
    ) -> Result<Vec<Fragment>, FragmentError> {
        log::info!(
            "Selecting orientation for {} fragments ({} mode)",
            fragments.len(),
            mode
        );
        let mut flipped = 0;
        let mut counting = |choice: &OrientationChoice| {
            if choice.orientation == Orientation::ReverseComplement {
                flipped += 1;
            }
            observer.orientation_chosen(choice);
        };
        let oriented = match mode {
            SelectionMode::Local => self.select_local(fragments, &mut counting)?,
            SelectionMode::Global => self.select_global(fragments, &mut counting)?,
        };
        log::info!(
            "Orientation selection finished: {} of {} fragments reverse-complemented",
            flipped,
            oriented.len()
        );
        Ok(oriented)
    }

    /// Aggregate bidirectional overlap of `candidate` against `references`.
    pub fn score(&self, candidate: &Fragment, references: &[Fragment]) -> usize {
        self.overlap
            .aggregate_score(candidate.sequence(), references.iter().map(Fragment::sequence))
    }

    /// Reverse complement of every fragment, with ids no input already uses.
    ///
    /// The id is `<id>_rc`; if an input carries that id a counter is appended
    /// (`<id>_rc2`, `<id>_rc3`, ...).
    fn reverse_all(&self, fragments: &[Fragment]) -> Result<Vec<Fragment>, FragmentError> {
        let mut taken: HashSet<String> = fragments.iter().map(|f| f.id().to_string()).collect();
        fragments
            .iter()
            .map(|fragment| -> Result<Fragment, FragmentError> {
                let reverse = fragment.reverse_complement(self.validation)?;
                if taken.insert(reverse.id().to_string()) {
                    return Ok(reverse);
                }
                let mut counter = 2;
                loop {
                    let id = format!("{}{}{}", fragment.id(), REVCOMP_SUFFIX, counter);
                    if taken.insert(id.clone()) {
                        log::debug!("Reverse complement of {} renamed to {}", fragment.id(), id);
                        return Ok(Fragment::from_parts(id, reverse.sequence().to_string()));
                    }
                    counter += 1;
                }
            })
            .collect()
    }

    fn select_local(
        &self,
        fragments: &[Fragment],
        emit: &mut dyn FnMut(&OrientationChoice),
    ) -> Result<Vec<Fragment>, FragmentError> {
        let reversed = self.reverse_all(fragments)?;
        let mut oriented: Vec<Fragment> = Vec::with_capacity(fragments.len());

        for (fragment, reverse) in fragments.iter().zip(reversed) {
            let forward_score = self.score(fragment, &oriented);
            let reverse_score = self.score(&reverse, &oriented);

            // Ties keep the fragment as read; the first fragment always ties at 0.
            let orientation = if reverse_score > forward_score {
                Orientation::ReverseComplement
            } else {
                Orientation::Forward
            };
            emit(&OrientationChoice {
                fragment_id: fragment.id().to_string(),
                orientation,
                forward_score,
                reverse_score,
            });

            oriented.push(match orientation {
                Orientation::Forward => fragment.clone(),
                Orientation::ReverseComplement => reverse,
            });
        }

        Ok(oriented)
    }

    fn select_global(
        &self,
        fragments: &[Fragment],
        emit: &mut dyn FnMut(&OrientationChoice),
    ) -> Result<Vec<Fragment>, FragmentError> {
        let reversed = self.reverse_all(fragments)?;

        let mut anchor: Option<Candidate> = None;
        for (index, fragment) in fragments.iter().enumerate() {
            let others = || {
                fragments
                    .iter()
                    .enumerate()
                    .filter(move |(other, _)| *other != index)
                    .map(|(_, other)| other.sequence())
            };
            let forward_score = self.overlap.aggregate_score(fragment.sequence(), others());
            let reverse_score = self
                .overlap
                .aggregate_score(reversed[index].sequence(), others());
            consider(&mut anchor, index, forward_score, reverse_score);
        }

        let Some(anchor) = anchor else {
            return Ok(Vec::new());
        };
        log::debug!(
            "Anchor fragment {} ({:?}, score {})",
            fragments[anchor.index].id(),
            anchor.orientation,
            anchor.score
        );

        let mut placed: Vec<Fragment> = Vec::with_capacity(fragments.len());
        let mut pool: Vec<usize> = (0..fragments.len()).collect();
        let mut next = anchor;
        loop {
            emit(&OrientationChoice {
                fragment_id: fragments[next.index].id().to_string(),
                orientation: next.orientation,
                forward_score: next.forward_score,
                reverse_score: next.reverse_score,
            });
            placed.push(match next.orientation {
                Orientation::Forward => fragments[next.index].clone(),
                Orientation::ReverseComplement => reversed[next.index].clone(),
            });
            pool.retain(|&index| index != next.index);

            let mut best: Option<Candidate> = None;
            for &index in &pool {
                let forward_score = self.score(&fragments[index], &placed);
                let reverse_score = self.score(&reversed[index], &placed);
                consider(&mut best, index, forward_score, reverse_score);
            }
            match best {
                Some(candidate) => next = candidate,
                None => break,
            }
        }

        Ok(placed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingObserver;
    use crate::fragment::reverse_complement;

    const SOURCE: &str = "ATGGCGTACGTTAGCCATGCAAGTCTGACCGTAATGC";

    fn slices() -> Vec<Fragment> {
        [
            "ATGGCGTACGTT",
            "ACGTTAGCCATG",
            "CCATGCAAGTCT",
            "AGTCTGACCGTA",
            "CCGTAATGC",
        ]
        .iter()
        .enumerate()
        .map(|(idx, seq)| Fragment::new(format!("f{idx}"), seq).unwrap())
        .collect()
    }

    fn flipped() -> Vec<Fragment> {
        slices()
            .into_iter()
            .map(|f| match f.id() {
                "f1" | "f3" => Fragment::new(f.id(), reverse_complement(f.sequence())).unwrap(),
                _ => f,
            })
            .collect()
    }

    fn ids(fragments: &[Fragment]) -> Vec<&str> {
        fragments.iter().map(Fragment::id).collect()
    }

    #[test]
    fn parses_selection_mode() {
        assert_eq!("local".parse::<SelectionMode>(), Ok(SelectionMode::Local));
        assert_eq!("GLOBAL".parse::<SelectionMode>(), Ok(SelectionMode::Global));
        assert!("sideways".parse::<SelectionMode>().is_err());
    }

    #[test]
    fn local_mode_restores_flipped_fragments_in_input_order() {
        let selector = OrientationSelector::default();
        let oriented = selector.select(&flipped(), SelectionMode::Local).unwrap();

        assert_eq!(ids(&oriented), vec!["f0", "f1_rc", "f2", "f3_rc", "f4"]);
        let expected: Vec<String> = slices().iter().map(|f| f.sequence().to_string()).collect();
        let got: Vec<&str> = oriented.iter().map(Fragment::sequence).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn local_mode_keeps_first_fragment_and_ties_forward() {
        let fragments = vec![
            Fragment::new("a", "AAAA").unwrap(),
            Fragment::new("b", "CCCC").unwrap(),
        ];
        let mut observer = RecordingObserver::default();
        let oriented = OrientationSelector::default()
            .select_observed(&fragments, SelectionMode::Local, &mut observer)
            .unwrap();
        assert_eq!(ids(&oriented), vec!["a", "b"]);
        assert_eq!(observer.orientations.len(), 2);
        assert!(observer
            .orientations
            .iter()
            .all(|choice| choice.orientation == Orientation::Forward));
    }

    #[test]
    fn global_mode_picks_one_consistent_strand() {
        let selector = OrientationSelector::default();
        let oriented = selector.select(&flipped(), SelectionMode::Global).unwrap();

        // The anchor is f2 reverse-complemented, so the whole layout follows
        // the opposite strand.
        assert_eq!(ids(&oriented), vec!["f2_rc", "f1", "f0_rc", "f3", "f4_rc"]);
        assert_eq!(oriented.len(), 5);
        assert_eq!(oriented[0].sequence(), reverse_complement("CCATGCAAGTCT"));
    }

    #[test]
    fn global_mode_reorders_well_oriented_input_without_flipping() {
        let mut observer = RecordingObserver::default();
        let oriented = OrientationSelector::default()
            .select_observed(&slices(), SelectionMode::Global, &mut observer)
            .unwrap();
        assert_eq!(ids(&oriented), vec!["f1", "f0", "f2", "f3", "f4"]);
        assert_eq!(observer.orientations.len(), 5);
        assert_eq!(observer.orientations[0].fragment_id, "f1");
    }

    #[test]
    fn local_mode_leaves_well_oriented_input_unchanged() {
        let oriented = OrientationSelector::default()
            .select(&slices(), SelectionMode::Local)
            .unwrap();
        assert_eq!(oriented, slices());
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let selector = OrientationSelector::default();
        assert!(selector.select(&[], SelectionMode::Local).unwrap().is_empty());
        assert!(selector.select(&[], SelectionMode::Global).unwrap().is_empty());
    }

    #[test]
    fn strict_mode_rejects_invalid_fragments() {
        let selector = OrientationSelector::new(AssemblyConfig {
            validation: ValidationMode::Strict,
            ..Default::default()
        });
        let fragments = vec![Fragment::new("n", "ACNT").unwrap()];
        assert!(selector.select(&fragments, SelectionMode::Local).is_err());
        assert!(selector.select(&fragments, SelectionMode::Global).is_err());
    }

    #[test]
    fn reverse_ids_avoid_existing_input_ids() {
        let fragments = vec![
            Fragment::new("x_rc", "ATGGCGTACG").unwrap(),
            Fragment::new("x", "GCTAACGTAC").unwrap(),
        ];
        let oriented = OrientationSelector::default()
            .select(&fragments, SelectionMode::Local)
            .unwrap();
        assert_eq!(ids(&oriented), vec!["x_rc", "x_rc2"]);
        assert_eq!(oriented[1].sequence(), "GTACGTTAGC");

        let graph = crate::graph::OverlapGraph::build(oriented, OverlapConfig::default()).unwrap();
        let assembled = crate::assembler::GreedyAssembler::new().assemble(graph).unwrap();
        assert_eq!(assembled.sequence(), "ATGGCGTACGTTAGC");
    }

    #[test]
    fn source_slices_reassemble() {
        // Sanity check that the fixture really tiles SOURCE.
        let joined = slices()
            .iter()
            .skip(1)
            .fold(slices()[0].sequence().to_string(), |acc, f| {
                let overlap = crate::overlap::suffix_prefix_overlap(&acc, f.sequence());
                acc + &f.sequence()[overlap..]
            });
        assert_eq!(joined, SOURCE);
    }
}
