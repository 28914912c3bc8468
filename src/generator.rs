//! Synthetic source sequences and overlapping fragment sets for testing.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::fragment::{reverse_complement, Fragment};

const BASES: &[u8; 4] = b"ACGT";

/// Fragment lengths are drawn uniformly from `avg ± LENGTH_SPREAD`.
pub const LENGTH_SPREAD: usize = 5;

/// Parameters for [`FragmentGenerator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorConfig {
    /// Length of the random source sequence.
    pub total_length: usize,
    /// Mean fragment length.
    pub avg_fragment_length: usize,
    /// Overlap between consecutive fragments.
    pub min_overlap: usize,
    /// Shuffle the fragment order after slicing.
    pub shuffle: bool,
    /// Probability that a fragment is emitted reverse-complemented.
    pub reverse_ratio: f64,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            total_length: 1000,
            avg_fragment_length: 100,
            min_overlap: 20,
            shuffle: true,
            reverse_ratio: 0.4,
            seed: 42,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeneratorError {
    #[error("total length {total_length} must exceed the overlap {min_overlap}")]
    SourceTooShort {
        total_length: usize,
        min_overlap: usize,
    },
    #[error(
        "average fragment length {avg} must be at least overlap + {} (= {})",
        LENGTH_SPREAD + 1,
        .min_overlap + LENGTH_SPREAD + 1
    )]
    FragmentsTooShort { avg: usize, min_overlap: usize },
    #[error("reverse ratio {0} must lie within [0, 1]")]
    InvalidReverseRatio(f64),
}

/// A generated source sequence and the fragments cut from it.
#[derive(Debug, Clone)]
pub struct SyntheticRun {
    pub source: String,
    pub fragments: Vec<Fragment>,
}

/// Seeded generator of overlapping fragment sets.
#[derive(Debug)]
pub struct FragmentGenerator {
    config: GeneratorConfig,
    rng: StdRng,
}

impl FragmentGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, GeneratorError> {
        if config.total_length <= config.min_overlap {
            return Err(GeneratorError::SourceTooShort {
                total_length: config.total_length,
                min_overlap: config.min_overlap,
            });
        }
        if config.avg_fragment_length < config.min_overlap + LENGTH_SPREAD + 1 {
            return Err(GeneratorError::FragmentsTooShort {
                avg: config.avg_fragment_length,
                min_overlap: config.min_overlap,
            });
        }
        if !(0.0..=1.0).contains(&config.reverse_ratio) {
            return Err(GeneratorError::InvalidReverseRatio(config.reverse_ratio));
        }

        Ok(Self {
            config,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Uniform random sequence over `ACGT`.
    pub fn random_dna(&mut self, length: usize) -> String {
        (0..length)
            .map(|_| BASES[self.rng.gen_range(0..BASES.len())] as char)
            .collect()
    }

    /// Cut `sequence` into slices that overlap their neighbour by `min_overlap`.
    ///
    /// Ids are `f0`, `f1`, ... in source order. The last slice always reaches
    /// the end of the sequence.
    pub fn fragment_sequence(&mut self, sequence: &str) -> Vec<Fragment> {
        let overlap = self.config.min_overlap;
        let avg = self.config.avg_fragment_length;
        let limit = sequence.len().saturating_sub(overlap);

        let mut fragments = Vec::new();
        let mut start = 0;
        while start < limit {
            let length = self
                .rng
                .gen_range(avg - LENGTH_SPREAD..=avg + LENGTH_SPREAD);
            let end = (start + length).min(sequence.len());
            fragments.push(Fragment::from_parts(
                format!("f{}", fragments.len()),
                sequence[start..end].to_string(),
            ));
            start += length - overlap;
        }
        fragments
    }

    /// Generate a source, slice it, then optionally shuffle and flip fragments.
    pub fn generate(&mut self) -> SyntheticRun {
        let source = self.random_dna(self.config.total_length);
        let mut fragments = self.fragment_sequence(&source);

        if self.config.shuffle {
            fragments.shuffle(&mut self.rng);
        }
        if self.config.reverse_ratio > 0.0 {
            fragments = fragments
                .into_iter()
                .map(|fragment| {
                    if self.rng.gen_bool(self.config.reverse_ratio) {
                        // Same id: the reader of a real run cannot tell either.
                        Fragment::from_parts(
                            fragment.id().to_string(),
                            reverse_complement(fragment.sequence()),
                        )
                    } else {
                        fragment
                    }
                })
                .collect();
        }

        log::info!(
            "Generated {} fragments from a {} bp source (seed {})",
            fragments.len(),
            source.len(),
            self.config.seed
        );
        SyntheticRun { source, fragments }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_parameters() {
        let too_short = GeneratorConfig {
            total_length: 10,
            min_overlap: 10,
            ..Default::default()
        };
        assert!(matches!(
            FragmentGenerator::new(too_short),
            Err(GeneratorError::SourceTooShort { .. })
        ));

        let narrow = GeneratorConfig {
            avg_fragment_length: 25,
            min_overlap: 20,
            ..Default::default()
        };
        assert!(matches!(
            FragmentGenerator::new(narrow),
            Err(GeneratorError::FragmentsTooShort { .. })
        ));

        let ratio = GeneratorConfig {
            reverse_ratio: 1.5,
            ..Default::default()
        };
        assert_eq!(
            FragmentGenerator::new(ratio).unwrap_err(),
            GeneratorError::InvalidReverseRatio(1.5)
        );
    }

    #[test]
    fn slices_tile_the_source_with_fixed_overlap() {
        let config = GeneratorConfig {
            total_length: 500,
            avg_fragment_length: 60,
            min_overlap: 15,
            shuffle: false,
            reverse_ratio: 0.0,
            seed: 3,
        };
        let run = FragmentGenerator::new(config).unwrap().generate();
        assert_eq!(run.source.len(), 500);
        assert!(run.fragments.len() > 1);

        let mut offset = 0;
        for (idx, fragment) in run.fragments.iter().enumerate() {
            assert_eq!(fragment.id(), format!("f{idx}"));
            assert_eq!(&run.source[offset..offset + fragment.len()], fragment.sequence());
            if idx + 1 < run.fragments.len() {
                assert!((55..=65).contains(&fragment.len()));
            }
            offset += fragment.len() - 15;
        }
        assert!(run.source.ends_with(run.fragments.last().unwrap().sequence()));
    }

    #[test]
    fn same_seed_gives_same_run() {
        let config = GeneratorConfig::default();
        let first = FragmentGenerator::new(config).unwrap().generate();
        let second = FragmentGenerator::new(config).unwrap().generate();
        assert_eq!(first.source, second.source);
        assert_eq!(first.fragments, second.fragments);
    }

    #[test]
    fn full_reverse_ratio_flips_every_fragment() {
        let config = GeneratorConfig {
            shuffle: false,
            reverse_ratio: 1.0,
            ..Default::default()
        };
        let run = FragmentGenerator::new(config).unwrap().generate();
        let first = &run.fragments[0];
        assert_eq!(
            reverse_complement(first.sequence()),
            run.source[..first.len()]
        );
    }
}
