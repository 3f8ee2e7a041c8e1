//! Cross-file delta encoding engine for refsync
//!
//! This crate is the algorithmic core of refsync. Given a new file's bytes
//! and a corpus of previously synchronized files, it computes a compact
//! instruction sequence that reconstructs the file at the destination:
//!
//! - **Matching**: [`GreedyMatcher`] discovers equal byte runs between the
//!   candidate file and one reference file, including partial and
//!   non-block-aligned overlaps. The matcher sits behind the [`Matcher`]
//!   trait so a different algorithm can be substituted without touching the
//!   planner or the client.
//! - **Planning**: [`InstructionPlanner`] merges the raw matches from every
//!   reference, prunes short and conflicting ones, and emits an ordered
//!   [`Instruction`] list covering every byte of the candidate exactly once.
//!
//! # Examples
//!
//! ```rust
//! use refsync_delta::{GreedyMatcher, InstructionPlanner, Matcher, PlannerConfig, SourceMatch};
//!
//! let candidate = b"abcXYZdef";
//! let reference = b"0123456789XYZ0123";
//!
//! let matcher = GreedyMatcher::new();
//! let matches: Vec<SourceMatch> = matcher
//!     .find_matches(candidate, reference)
//!     .into_iter()
//!     .map(|range| SourceMatch::new("ref.bin", range))
//!     .collect();
//!
//! let planner = InstructionPlanner::new(PlannerConfig { min_match_len: 3 });
//! let plan = planner.plan(candidate.len(), matches);
//! assert_eq!(plan.len(), 3);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod matcher;
pub mod plan;

pub use matcher::{GreedyMatcher, MatchRange, Matcher};
pub use plan::{coverage_is_exact, Instruction, InstructionPlanner, PlannerConfig, SourceMatch};
