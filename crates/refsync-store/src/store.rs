//! Directory-backed append/range-copy storage

use refsync_types::{Error, Result};
use std::collections::HashMap;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// Per-file storage rooted at a destination directory.
///
/// Stored files are opaque byte blobs keyed by name, created implicitly on
/// first write and never deleted. Content is only ever extended; the one
/// exception is [`reset`](Self::reset), which truncates a file back to
/// empty so an interrupted reconstruction can start over cleanly.
///
/// Operations targeting the same destination file are serialized through a
/// per-file lock; reads of source files take no lock, since a file is only
/// offered as a copy source once it is fully written and no longer changes.
#[derive(Debug)]
pub struct ByteRangeStore {
    root: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ByteRangeStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| Error::Io {
            message: format!(
                "failed to create store directory '{}': {}",
                root.display(),
                e
            ),
        })?;
        debug!("opened byte range store at {}", root.display());
        Ok(Self {
            root,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// The destination directory this store writes into
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Append `data` to the named file, creating it if absent.
    ///
    /// An empty `data` slice still creates the file, which is how an empty
    /// candidate materializes at the destination.
    pub async fn append(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.file_path(name)?;
        let _guard = self.file_lock(name).await;
        self.append_unlocked(&path, name, data).await?;
        trace!("appended {} bytes to '{}'", data.len(), name);
        Ok(())
    }

    /// Copy `length` bytes from `source` at `offset` onto the end of the
    /// named file, creating it if absent.
    ///
    /// Fails with [`Error::FileNotFound`] if `source` does not exist and
    /// with [`Error::OutOfRange`] if the requested range reaches past the
    /// source's current length; it never truncates or pads.
    pub async fn copy_range(
        &self,
        name: &str,
        source: &str,
        offset: u64,
        length: u64,
    ) -> Result<()> {
        let dest_path = self.file_path(name)?;
        let source_path = self.file_path(source)?;

        let available = match fs::metadata(&source_path).await {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::FileNotFound {
                    name: source.to_string(),
                });
            }
            Err(e) => {
                return Err(Error::Io {
                    message: format!("failed to stat stored file '{}': {}", source, e),
                });
            }
        };

        let end = offset.checked_add(length).ok_or_else(|| Error::OutOfRange {
            name: source.to_string(),
            offset,
            length,
            available,
        })?;
        if end > available {
            return Err(Error::OutOfRange {
                name: source.to_string(),
                offset,
                length,
                available,
            });
        }

        let mut reader = fs::File::open(&source_path).await.map_err(|e| Error::Io {
            message: format!("failed to open stored file '{}': {}", source, e),
        })?;
        reader
            .seek(SeekFrom::Start(offset))
            .await
            .map_err(|e| Error::Io {
                message: format!("failed to seek in stored file '{}': {}", source, e),
            })?;
        let mut chunk = vec![0u8; length as usize];
        reader.read_exact(&mut chunk).await.map_err(|e| Error::Io {
            message: format!("failed to read range from stored file '{}': {}", source, e),
        })?;

        let _guard = self.file_lock(name).await;
        self.append_unlocked(&dest_path, name, &chunk).await?;
        trace!(
            "copied [{}, {}) from '{}' onto '{}'",
            offset,
            end,
            source,
            name
        );
        Ok(())
    }

    /// Truncate the named file to empty, creating it if absent.
    ///
    /// Issued by the client before replaying a file's instructions so a
    /// partial destination left by an interrupted earlier attempt never
    /// survives as a corrupt prefix.
    pub async fn reset(&self, name: &str) -> Result<()> {
        let path = self.file_path(name)?;
        let _guard = self.file_lock(name).await;
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .await
            .map_err(|e| Error::Io {
                message: format!("failed to reset stored file '{}': {}", name, e),
            })?;
        debug!("reset stored file '{}'", name);
        Ok(())
    }

    /// Current length of the named file in bytes
    pub async fn len(&self, name: &str) -> Result<u64> {
        let path = self.file_path(name)?;
        match fs::metadata(&path).await {
            Ok(metadata) => Ok(metadata.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::FileNotFound {
                name: name.to_string(),
            }),
            Err(e) => Err(Error::Io {
                message: format!("failed to stat stored file '{}': {}", name, e),
            }),
        }
    }

    /// Read the named file's full content
    pub async fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.file_path(name)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::FileNotFound {
                name: name.to_string(),
            }),
            Err(e) => Err(Error::Io {
                message: format!("failed to read stored file '{}': {}", name, e),
            }),
        }
    }

    async fn append_unlocked(&self, path: &Path, name: &str, data: &[u8]) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| Error::Io {
                message: format!("failed to open stored file '{}': {}", name, e),
            })?;
        file.write_all(data).await.map_err(|e| Error::Io {
            message: format!("failed to append to stored file '{}': {}", name, e),
        })?;
        Ok(())
    }

    /// Resolve a stored file name under the root, rejecting names that could
    /// escape it.
    fn file_path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
        {
            return Err(Error::protocol(format!("invalid stored file name '{}'", name)));
        }
        Ok(self.root.join(name))
    }

    async fn file_lock(&self, name: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(name.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}
