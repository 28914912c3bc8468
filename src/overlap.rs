//! Exact suffix/prefix overlap scoring and the directed edge value type.

use serde::Serialize;

use crate::graph::FragmentId;

/// Configuration options that govern which overlaps count as edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapConfig {
    /// Shortest overlap reported; anything shorter scores 0.
    pub min_overlap: usize,
    /// Allow an overlap spanning the whole of the shorter sequence.
    pub allow_containment: bool,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            min_overlap: 1,
            allow_containment: false,
        }
    }
}

impl OverlapConfig {
    /// Longest suffix of `a` equal to a prefix of `b`, under this config.
    ///
    /// Candidate lengths are tested from the longest allowed down to
    /// `min_overlap`, so the first hit is the maximal overlap.
    pub fn overlap(&self, a: &str, b: &str) -> usize {
        let a = a.as_bytes();
        let b = b.as_bytes();
        let shorter = a.len().min(b.len());
        let max_span = if self.allow_containment {
            shorter
        } else {
            shorter.saturating_sub(1)
        };
        let min_span = self.min_overlap.max(1);

        (min_span..=max_span)
            .rev()
            .find(|&span| a[a.len() - span..] == b[..span])
            .unwrap_or(0)
    }

    /// Bidirectional overlap score of `candidate` against every reference.
    pub fn aggregate_score<'a, I>(&self, candidate: &str, references: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        references
            .into_iter()
            .map(|reference| {
                self.overlap(reference, candidate) + self.overlap(candidate, reference)
            })
            .sum()
    }
}

/// Longest proper suffix of `a` that is a prefix of `b` (reference rules).
pub fn suffix_prefix_overlap(a: &str, b: &str) -> usize {
    OverlapConfig::default().overlap(a, b)
}

/// A directed overlap edge between two fragments held by a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Overlap {
    pub source: FragmentId,
    pub target: FragmentId,
    pub length: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_maximal_overlap() {
        assert_eq!(suffix_prefix_overlap("AGT", "GTA"), 2);
        assert_eq!(suffix_prefix_overlap("AAGCT", "GCTTA"), 3);
        assert_eq!(suffix_prefix_overlap("GCTTA", "CTTAG"), 4);
    }

    #[test]
    fn prefers_longest_of_several_matches() {
        // Both "A" and "ATA" are suffix/prefix matches.
        assert_eq!(suffix_prefix_overlap("GGATA", "ATAGG"), 3);
    }

    #[test]
    fn reports_zero_without_match() {
        assert_eq!(suffix_prefix_overlap("AAAA", "TTTT"), 0);
        assert_eq!(suffix_prefix_overlap("TTTT", "AAAA"), 0);
    }

    #[test]
    fn excludes_full_length_overlap_by_default() {
        assert_eq!(suffix_prefix_overlap("ACG", "ACGT"), 0);
        assert_eq!(suffix_prefix_overlap("A", "A"), 0);
        assert_eq!(suffix_prefix_overlap("GACG", "ACG"), 0);
    }

    #[test]
    fn containment_can_be_enabled() {
        let config = OverlapConfig {
            allow_containment: true,
            ..Default::default()
        };
        assert_eq!(config.overlap("GACG", "ACG"), 3);
        assert_eq!(config.overlap("A", "A"), 1);
    }

    #[test]
    fn minimum_overlap_filters_short_matches() {
        let config = OverlapConfig {
            min_overlap: 3,
            ..Default::default()
        };
        assert_eq!(config.overlap("AGT", "GTA"), 0);
        assert_eq!(config.overlap("AAGCT", "GCTTA"), 3);
    }

    #[test]
    fn aggregate_score_counts_both_directions() {
        let config = OverlapConfig::default();
        // AAGCT->GCTTA 3, GCTTA->AAGCT 1, CTTAG->GCTTA 1, GCTTA->CTTAG 4
        let score = config.aggregate_score("GCTTA", ["AAGCT", "CTTAG"]);
        assert_eq!(score, 9);
        assert_eq!(config.aggregate_score("GCTTA", std::iter::empty()), 0);
    }
}
