//! Run-wide configuration shared by the selector, the graph and the CLI.

use crate::fragment::ValidationMode;
use crate::overlap::OverlapConfig;

/// Options for a full orient-build-assemble run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssemblyConfig {
    /// Alphabet policy for parsed and reverse-complemented fragments.
    pub validation: ValidationMode,
    /// Overlap rules used by both the orientation selector and the graph.
    pub overlap: OverlapConfig,
}
