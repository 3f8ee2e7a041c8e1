//! Matching of equal byte runs between a candidate and a reference file

use std::collections::HashMap;

/// An equal byte run discovered between a candidate file and one reference
/// file: `candidate[local_start..local_start + len]` equals
/// `reference[source_start..source_start + len]`.
///
/// A matcher never returns zero-length ranges, and the ranges it returns for
/// one reference do not overlap each other on either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRange {
    /// Start offset in the candidate file
    pub local_start: usize,
    /// Start offset in the reference file
    pub source_start: usize,
    /// Length of the equal run
    pub len: usize,
}

impl MatchRange {
    /// End offset (exclusive) of the run in the candidate file
    pub fn local_end(&self) -> usize {
        self.local_start + self.len
    }
}

/// Capability of discovering equal byte runs between two byte sequences.
///
/// Implementations must be pure functions of their two inputs. The candidate
/// must never be offered as its own reference; a sequence matched against
/// itself trivially yields the whole sequence, which is useless for delta
/// encoding and is excluded by the caller.
pub trait Matcher: Send + Sync {
    /// Find non-overlapping equal byte runs between `candidate` and
    /// `reference`, ordered by candidate offset.
    fn find_matches(&self, candidate: &[u8], reference: &[u8]) -> Vec<MatchRange>;
}

/// Greedy longest-common-substring matcher.
///
/// Repeatedly finds the single longest common substring between the two
/// remaining unmatched regions, splits both sequences at that match, and
/// recurses on the left and right remainders independently. The greedy
/// ordering is deliberately non-optimal: a short match found first can block
/// recognition of a longer match overlapping it. The trade is bounded work
/// for a decomposition that is good enough to cut transfer volume.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyMatcher;

impl GreedyMatcher {
    /// Create a new greedy matcher
    pub fn new() -> Self {
        Self
    }

    /// Find the longest common substring between `candidate[c_lo..c_hi]` and
    /// the reference positions in `[r_lo, r_hi)`.
    ///
    /// Among equally long runs, the one starting earliest in the candidate
    /// wins, then earliest in the reference, so results are deterministic.
    fn longest_match(
        candidate: &[u8],
        index: &ByteIndex,
        c_lo: usize,
        c_hi: usize,
        r_lo: usize,
        r_hi: usize,
    ) -> MatchRange {
        let mut best = MatchRange {
            local_start: c_lo,
            source_start: r_lo,
            len: 0,
        };

        // run_ends[j] = length of the common run ending at candidate position
        // i and reference position j, carried across the i loop.
        let mut run_ends: HashMap<usize, usize> = HashMap::new();
        for i in c_lo..c_hi {
            let mut next_run_ends = HashMap::new();
            for &j in index.positions(candidate[i]) {
                if j < r_lo {
                    continue;
                }
                if j >= r_hi {
                    break;
                }
                let run = if j > r_lo {
                    run_ends.get(&(j - 1)).copied().unwrap_or(0) + 1
                } else {
                    1
                };
                next_run_ends.insert(j, run);
                if run > best.len {
                    best = MatchRange {
                        local_start: i + 1 - run,
                        source_start: j + 1 - run,
                        len: run,
                    };
                }
            }
            run_ends = next_run_ends;
        }

        best
    }
}

impl Matcher for GreedyMatcher {
    fn find_matches(&self, candidate: &[u8], reference: &[u8]) -> Vec<MatchRange> {
        if candidate.is_empty() || reference.is_empty() {
            return Vec::new();
        }

        let index = ByteIndex::build(reference);
        let mut matches = Vec::new();
        let mut pending = vec![(0, candidate.len(), 0, reference.len())];

        while let Some((c_lo, c_hi, r_lo, r_hi)) = pending.pop() {
            if c_lo >= c_hi || r_lo >= r_hi {
                continue;
            }
            let found = Self::longest_match(candidate, &index, c_lo, c_hi, r_lo, r_hi);
            if found.len == 0 {
                continue;
            }
            pending.push((c_lo, found.local_start, r_lo, found.source_start));
            pending.push((
                found.local_start + found.len,
                c_hi,
                found.source_start + found.len,
                r_hi,
            ));
            matches.push(found);
        }

        matches.sort_by_key(|m| m.local_start);
        matches
    }
}

/// Positions of each byte value within the reference, ascending.
struct ByteIndex {
    positions: Vec<Vec<usize>>,
}

impl ByteIndex {
    fn build(reference: &[u8]) -> Self {
        let mut positions = vec![Vec::new(); 256];
        for (j, &byte) in reference.iter().enumerate() {
            positions[byte as usize].push(j);
        }
        Self { positions }
    }

    fn positions(&self, byte: u8) -> &[usize] {
        &self.positions[byte as usize]
    }
}
