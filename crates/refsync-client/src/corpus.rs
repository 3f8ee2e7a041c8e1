//! Reference corpus and synchronization state

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// One fully synchronized file usable as a match source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusEntry {
    /// Stored file name at the destination
    pub name: String,
    /// Path of the file's content on the source side
    pub path: PathBuf,
}

/// The ordered set of files already fully synchronized.
///
/// Grows monotonically, one entry per successful synchronization. Order
/// matters for preference only, not correctness: when several references
/// hold the same content, matches from earlier entries win planner ties. A
/// file must never be added before its own synchronization has fully
/// completed, so in-flight files cannot be offered as copy sources.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCorpus {
    entries: Vec<CorpusEntry>,
}

impl ReferenceCorpus {
    /// Create an empty corpus
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fully synchronized file
    pub fn push(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        let entry = CorpusEntry {
            name: name.into(),
            path: path.into(),
        };
        if !self.entries.iter().any(|e| e.name == entry.name) {
            self.entries.push(entry);
        }
    }

    /// Iterate entries in corpus order
    pub fn iter(&self) -> impl Iterator<Item = &CorpusEntry> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the corpus is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Which source paths have already been synchronized.
///
/// Append-only and in-memory; lost on restart, at which point every file is
/// rediscovered and re-synchronized from scratch.
#[derive(Debug, Clone, Default)]
pub struct SyncState {
    synced: HashSet<PathBuf>,
}

impl SyncState {
    /// Create empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a path as fully synchronized
    pub fn mark_synced(&mut self, path: impl Into<PathBuf>) {
        self.synced.insert(path.into());
    }

    /// Whether a path has been fully synchronized
    pub fn is_synced(&self, path: &Path) -> bool {
        self.synced.contains(path)
    }

    /// Number of synchronized paths
    pub fn len(&self) -> usize {
        self.synced.len()
    }

    /// Whether nothing has been synchronized yet
    pub fn is_empty(&self) -> bool {
        self.synced.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_preserves_insertion_order() {
        let mut corpus = ReferenceCorpus::new();
        corpus.push("b.txt", "/src/b.txt");
        corpus.push("a.txt", "/src/a.txt");

        let names: Vec<_> = corpus.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["b.txt", "a.txt"]);
    }

    #[test]
    fn test_corpus_ignores_duplicate_names() {
        let mut corpus = ReferenceCorpus::new();
        corpus.push("a.txt", "/src/a.txt");
        corpus.push("a.txt", "/elsewhere/a.txt");

        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.iter().next().unwrap().path, PathBuf::from("/src/a.txt"));
    }

    #[test]
    fn test_sync_state_marks_paths() {
        let mut state = SyncState::new();
        assert!(state.is_empty());

        state.mark_synced("/src/a.txt");
        assert!(state.is_synced(Path::new("/src/a.txt")));
        assert!(!state.is_synced(Path::new("/src/b.txt")));
        assert_eq!(state.len(), 1);
    }
}
