//! Poll-based source directory discovery

use refsync_types::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::trace;

/// Discovers files in a flat source directory.
///
/// The watcher is deliberately simple: every poll lists the directory and
/// returns the regular files it contains, sorted by name so discovery order
/// (and with it the reference-corpus order) is deterministic. Subdirectories
/// are ignored; nested layouts are outside the synchronization contract.
#[derive(Debug, Clone)]
pub struct DirWatcher {
    source: PathBuf,
}

impl DirWatcher {
    /// Watch the given source directory
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// The watched source directory
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// List the regular files currently in the source directory, sorted by
    /// name
    pub async fn scan(&self) -> Result<Vec<PathBuf>> {
        let mut entries = fs::read_dir(&self.source).await.map_err(|e| Error::Io {
            message: format!(
                "failed to list source directory '{}': {}",
                self.source.display(),
                e
            ),
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| Error::Io {
            message: format!(
                "failed to read source directory '{}': {}",
                self.source.display(),
                e
            ),
        })? {
            let file_type = entry.file_type().await.map_err(|e| Error::Io {
                message: format!("failed to inspect '{}': {}", entry.path().display(), e),
            })?;
            if file_type.is_file() {
                files.push(entry.path());
            }
        }

        files.sort();
        trace!("scan of {} found {} files", self.source.display(), files.len());
        Ok(files)
    }
}
