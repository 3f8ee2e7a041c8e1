//! Reconstruction planning: from raw matches to an ordered instruction list

use crate::matcher::MatchRange;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::{debug, trace};

/// One unit of reconstruction for a candidate file.
///
/// An ordered instruction list tiles the candidate's byte range exactly:
/// `start` values are contiguous and non-overlapping, beginning at 0 and
/// ending at the file's total length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// Send `len` raw bytes of the candidate starting at `start` and append
    /// them to the destination file
    Literal {
        /// Start offset in the candidate file
        start: u64,
        /// Number of bytes
        len: u64,
    },
    /// Instruct the destination to append `len` bytes copied from the stored
    /// file `source` starting at `source_start`
    Reference {
        /// Start offset in the candidate file
        start: u64,
        /// Number of bytes
        len: u64,
        /// Name of the stored file to copy from
        source: String,
        /// Start offset in the stored file
        source_start: u64,
    },
}

impl Instruction {
    /// Start offset of this instruction's span in the candidate file
    pub fn start(&self) -> u64 {
        match self {
            Self::Literal { start, .. } | Self::Reference { start, .. } => *start,
        }
    }

    /// Length of this instruction's span
    pub fn len(&self) -> u64 {
        match self {
            Self::Literal { len, .. } | Self::Reference { len, .. } => *len,
        }
    }

    /// Whether the span is empty (never true for planner output)
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// End offset (exclusive) of this instruction's span
    pub fn end(&self) -> u64 {
        self.start() + self.len()
    }

    /// Whether this instruction copies from an already-stored file
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference { .. })
    }
}

/// A match range attributed to the stored file it was discovered in.
///
/// Matches are collected in reference-corpus order; the planner's stable
/// sorting preserves that order on ties, so earlier corpus entries are
/// preferred when several references share the same content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMatch {
    /// Name of the stored file the range was discovered in
    pub source: String,
    /// The discovered range
    pub range: MatchRange,
}

impl SourceMatch {
    /// Attribute a match range to a stored file
    pub fn new(source: impl Into<String>, range: MatchRange) -> Self {
        Self {
            source: source.into(),
            range,
        }
    }
}

/// Configuration for instruction planning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Minimum accepted match length, in bytes.
    ///
    /// Matches below this length cost more in per-instruction overhead than
    /// they save in transferred bytes; they fall back to literal data.
    pub min_match_len: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self { min_match_len: 32 }
    }
}

/// Plans the ordered instruction list that reconstructs a candidate file
/// from literal bytes and ranges of previously stored files.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstructionPlanner {
    config: PlannerConfig,
}

impl InstructionPlanner {
    /// Create a planner with the given configuration
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// The planner's configuration
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Compute the instruction list for a candidate of `file_len` bytes from
    /// the matches discovered across all references.
    ///
    /// Malformed ranges (empty, or reaching past `file_len`) are dropped
    /// before any other step so they can never corrupt the coverage
    /// invariant. The remaining matches are filtered by minimum length,
    /// accepted longest-first into a non-overlapping set, and the candidate
    /// is walked start to end, emitting a `Literal` for every gap and a
    /// `Reference` for every accepted match.
    pub fn plan(&self, file_len: usize, matches: Vec<SourceMatch>) -> Vec<Instruction> {
        if file_len == 0 {
            return Vec::new();
        }

        let total = matches.len();
        let mut usable: Vec<SourceMatch> = matches
            .into_iter()
            .filter(|m| {
                m.range.len > 0
                    && m.range
                        .local_start
                        .checked_add(m.range.len)
                        .is_some_and(|end| end <= file_len)
            })
            .filter(|m| m.range.len >= self.config.min_match_len)
            .collect();
        trace!(
            "kept {} of {} matches after length and bounds filtering",
            usable.len(),
            total
        );

        // Longest first; ties by candidate offset, then corpus order via
        // stable sort.
        usable.sort_by_key(|m| (Reverse(m.range.len), m.range.local_start));

        let mut chosen: Vec<SourceMatch> = Vec::new();
        for m in usable {
            let overlaps = chosen.iter().any(|c| {
                m.range.local_start < c.range.local_end()
                    && c.range.local_start < m.range.local_end()
            });
            if !overlaps {
                chosen.push(m);
            }
        }

        chosen.sort_by_key(|m| m.range.local_start);

        let mut instructions = Vec::new();
        let mut cursor = 0usize;
        for m in chosen {
            if cursor < m.range.local_start {
                instructions.push(Instruction::Literal {
                    start: cursor as u64,
                    len: (m.range.local_start - cursor) as u64,
                });
            }
            instructions.push(Instruction::Reference {
                start: m.range.local_start as u64,
                len: m.range.len as u64,
                source: m.source,
                source_start: m.range.source_start as u64,
            });
            cursor = m.range.local_end();
        }
        if cursor < file_len {
            instructions.push(Instruction::Literal {
                start: cursor as u64,
                len: (file_len - cursor) as u64,
            });
        }

        debug!(
            "planned {} instructions ({} references) for {} bytes",
            instructions.len(),
            instructions.iter().filter(|i| i.is_reference()).count(),
            file_len
        );
        debug_assert!(coverage_is_exact(&instructions, file_len as u64));
        instructions
    }
}

/// Check that an instruction list tiles `[0, file_len)` exactly: contiguous,
/// non-overlapping spans starting at 0 and ending at `file_len`.
pub fn coverage_is_exact(instructions: &[Instruction], file_len: u64) -> bool {
    let mut cursor = 0u64;
    for instruction in instructions {
        if instruction.is_empty() || instruction.start() != cursor {
            return false;
        }
        cursor = instruction.end();
    }
    cursor == file_len
}
