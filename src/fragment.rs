//! Immutable sequence reads and the reverse-complement primitive.

use std::fmt;

use bio::alphabets::dna;

/// Suffix appended to an id when a fragment is reverse-complemented.
pub const REVCOMP_SUFFIX: &str = "_rc";

/// How strictly fragment sequences are checked against the `ACGT` alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Log a warning for non-`ACGT` symbols and keep the fragment.
    #[default]
    Permissive,
    /// Reject any fragment containing non-`ACGT` symbols.
    Strict,
}

/// Errors raised while constructing a fragment.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FragmentError {
    #[error("fragment {id} has an empty sequence")]
    EmptySequence { id: String },
    #[error("fragment {id} contains non-ACGT symbol {symbol:?} at position {position}")]
    InvalidSymbol {
        id: String,
        symbol: char,
        position: usize,
    },
}

/// A single read: an identifier plus an upper-cased nucleotide sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fragment {
    id: String,
    sequence: String,
}

impl Fragment {
    /// Build a fragment using the permissive validation mode.
    pub fn new(id: impl Into<String>, sequence: impl AsRef<str>) -> Result<Self, FragmentError> {
        Self::with_mode(id, sequence, ValidationMode::Permissive)
    }

    /// Build a fragment, checking the sequence according to `mode`.
    ///
    /// The sequence is upper-cased before validation. An empty sequence is
    /// rejected regardless of mode.
    pub fn with_mode(
        id: impl Into<String>,
        sequence: impl AsRef<str>,
        mode: ValidationMode,
    ) -> Result<Self, FragmentError> {
        let id = id.into();
        let sequence = sequence.as_ref().to_ascii_uppercase();
        if sequence.is_empty() {
            return Err(FragmentError::EmptySequence { id });
        }

        if let Some((position, symbol)) = first_invalid_symbol(&sequence) {
            match mode {
                ValidationMode::Strict => {
                    return Err(FragmentError::InvalidSymbol {
                        id,
                        symbol,
                        position,
                    });
                }
                ValidationMode::Permissive => {
                    log::warn!(
                        "Fragment {} contains non-ACGT symbol {:?} at position {}; accepting",
                        id,
                        symbol,
                        position
                    );
                }
            }
        }

        Ok(Self { id, sequence })
    }

    /// Construct from a sequence already known to be upper-case and non-empty.
    pub(crate) fn from_parts(id: String, sequence: String) -> Self {
        debug_assert!(!sequence.is_empty());
        Self { id, sequence }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Always `false`; kept for parity with `len`.
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Reverse-complement this fragment, re-validating under `mode`.
    ///
    /// The new id is the original id followed by [`REVCOMP_SUFFIX`]. In
    /// permissive mode symbols outside the IUPAC table are carried over
    /// unchanged, so the operation stays an involution.
    pub fn reverse_complement(&self, mode: ValidationMode) -> Result<Fragment, FragmentError> {
        let sequence = reverse_complement(&self.sequence);
        Fragment::with_mode(format!("{}{}", self.id, REVCOMP_SUFFIX), sequence, mode)
    }

    /// Concatenate `self` with `next` minus its first `overlap_len` bases.
    ///
    /// Callers must ensure `overlap_len < next.len()` or accept an empty tail.
    pub(crate) fn merged_sequence(&self, next: &Fragment, overlap_len: usize) -> String {
        let tail = next.sequence.get(overlap_len..).unwrap_or("");
        let mut merged = String::with_capacity(self.sequence.len() + tail.len());
        merged.push_str(&self.sequence);
        merged.push_str(tail);
        merged
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 20;
        match self.sequence.char_indices().nth(PREVIEW) {
            Some((cut, _)) => write!(f, "{} ({}...)", self.id, &self.sequence[..cut]),
            None => write!(f, "{} ({})", self.id, self.sequence),
        }
    }
}

/// Reverse-complement a nucleotide string (A<->T, C<->G, reversed).
///
/// Works per `char`: ASCII symbols go through the IUPAC complement table,
/// anything else is carried over as is.
pub fn reverse_complement(sequence: &str) -> String {
    sequence
        .chars()
        .rev()
        .map(|symbol| {
            if symbol.is_ascii() {
                dna::complement(symbol as u8) as char
            } else {
                symbol
            }
        })
        .collect()
}

fn first_invalid_symbol(sequence: &str) -> Option<(usize, char)> {
    sequence
        .char_indices()
        .find(|(_, c)| !matches!(c, 'A' | 'C' | 'G' | 'T'))
}
