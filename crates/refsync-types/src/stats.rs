//! Transfer statistics for synchronization operations

use serde::{Deserialize, Serialize};

/// Accounting for one or more synchronized files
///
/// Distinguishes bytes that had to be sent literally from bytes the
/// destination reconstructed by copying ranges out of files it already
/// holds. The difference is the transfer volume saved by delta encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferStats {
    /// Number of files fully synchronized
    pub files_synced: u64,
    /// Number of files that failed and await re-attempt
    pub files_failed: u64,
    /// Bytes sent over the wire as literal data
    pub literal_bytes: u64,
    /// Bytes reconstructed remotely from already-stored files
    pub copied_bytes: u64,
    /// Number of instructions replayed against the store
    pub instructions: u64,
}

impl TransferStats {
    /// Create empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Total logical bytes written to destination files
    pub fn bytes_total(&self) -> u64 {
        self.literal_bytes + self.copied_bytes
    }

    /// Fraction of logical bytes that did not need to be transferred
    pub fn savings_ratio(&self) -> f64 {
        let total = self.bytes_total();
        if total == 0 {
            0.0
        } else {
            self.copied_bytes as f64 / total as f64
        }
    }

    /// Merge another set of statistics into this one
    pub fn merge(&mut self, other: &Self) {
        self.files_synced += other.files_synced;
        self.files_failed += other.files_failed;
        self.literal_bytes += other.literal_bytes;
        self.copied_bytes += other.copied_bytes;
        self.instructions += other.instructions;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0, 0.0)]
    #[case(100, 0, 0.0)]
    #[case(0, 100, 1.0)]
    #[case(50, 150, 0.75)]
    fn test_savings_ratio(#[case] literal: u64, #[case] copied: u64, #[case] expected: f64) {
        let stats = TransferStats {
            literal_bytes: literal,
            copied_bytes: copied,
            ..Default::default()
        };
        assert!((stats.savings_ratio() - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn test_merge_accumulates_all_fields() {
        let mut a = TransferStats {
            files_synced: 1,
            files_failed: 2,
            literal_bytes: 10,
            copied_bytes: 20,
            instructions: 3,
        };
        let b = TransferStats {
            files_synced: 4,
            files_failed: 1,
            literal_bytes: 5,
            copied_bytes: 15,
            instructions: 2,
        };

        a.merge(&b);
        assert_eq!(a.files_synced, 5);
        assert_eq!(a.files_failed, 3);
        assert_eq!(a.bytes_total(), 50);
        assert_eq!(a.instructions, 5);
    }
}
