//! Unified test utilities for refsync tests and benchmarks

/// Test data generation patterns
#[derive(Debug, Clone, Copy)]
pub enum TestDataPattern {
    /// A single repeated byte - maximal self-similarity
    Uniform,
    /// Deterministic pseudo-random data - essentially no repeated runs
    Random,
    /// Text-like data with recurring words
    Realistic,
}

/// Generate test data with the given pattern.
///
/// Deterministic for reproducible tests and benchmarks; no randomness
/// source is involved.
pub fn generate_test_data(size: usize, pattern: TestDataPattern) -> Vec<u8> {
    match pattern {
        TestDataPattern::Uniform => vec![0x42u8; size],
        TestDataPattern::Random => {
            use std::collections::hash_map::DefaultHasher;
            use std::hash::{Hash, Hasher};

            let mut data = Vec::with_capacity(size);
            let mut hasher = DefaultHasher::new();
            for i in 0..size {
                i.hash(&mut hasher);
                data.push((hasher.finish() % 256) as u8);
            }
            data
        }
        TestDataPattern::Realistic => {
            let words = [
                "the quick brown fox ",
                "jumps over ",
                "a lazy dog ",
                "while the band plays on ",
            ];
            let mut data = Vec::with_capacity(size);
            let mut i = 0usize;
            while data.len() < size {
                data.extend_from_slice(words[i % words.len()].as_bytes());
                i += 1;
            }
            data.truncate(size);
            data
        }
    }
}

/// Splice `shared` into the middle of otherwise-unrelated filler.
///
/// Produces a file of `prefix + shared + suffix` where the filler is
/// derived from `seed`, so two files built from the same `shared` slice
/// (with different seeds) overlap in exactly that region and nowhere else.
pub fn with_shared_middle(shared: &[u8], filler: usize, seed: u64) -> Vec<u8> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let fill = |tag: u64, out: &mut Vec<u8>| {
        for i in 0..filler {
            let mut hasher = DefaultHasher::new();
            (seed, tag, i).hash(&mut hasher);
            out.push((hasher.finish() % 256) as u8);
        }
    };

    let mut data = Vec::with_capacity(filler * 2 + shared.len());
    fill(0, &mut data);
    data.extend_from_slice(shared);
    fill(1, &mut data);
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_data_is_deterministic() {
        for pattern in [
            TestDataPattern::Uniform,
            TestDataPattern::Random,
            TestDataPattern::Realistic,
        ] {
            assert_eq!(
                generate_test_data(1024, pattern),
                generate_test_data(1024, pattern)
            );
            assert_eq!(generate_test_data(1024, pattern).len(), 1024);
        }
    }

    #[test]
    fn test_shared_middle_embeds_slice() {
        let shared = generate_test_data(256, TestDataPattern::Random);
        let data = with_shared_middle(&shared, 64, 7);
        assert_eq!(data.len(), 256 + 128);
        assert_eq!(&data[64..320], shared.as_slice());
    }
}
