//! Transfer protocol for refsync
//!
//! The synchronization client drives the destination store through exactly
//! two remote operations: append raw bytes to a stored file, and copy a byte
//! range from one stored file onto the end of another. This crate defines
//! those operations as serializable messages ([`StoreRequest`] and
//! [`StoreResponse`]) and as an async capability trait ([`RemoteStore`])
//! that any transport can implement.
//!
//! The transport framing itself (sockets, HTTP routes) is out of scope; an
//! in-process implementation backed by a local store lives in
//! `refsync-store` and serves both tests and local-to-local synchronization.

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use async_trait::async_trait;
use refsync_types::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol version information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolVersion {
    /// Major version
    pub major: u16,
    /// Minor version
    pub minor: u16,
}

impl ProtocolVersion {
    /// Create a new protocol version
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Current protocol version
    pub const fn current() -> Self {
        Self::new(1, 0)
    }

    /// Check if this version can talk to another version
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        self.major == other.major && self.minor <= other.minor
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A request against the destination store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreRequest {
    /// Append raw bytes to the named file, creating it if absent
    Append {
        /// Destination file name
        name: String,
        /// Bytes to append
        data: Vec<u8>,
    },
    /// Copy a byte range out of one stored file onto the end of another,
    /// creating the destination if absent
    CopyRange {
        /// Destination file name
        name: String,
        /// Source file name
        source: String,
        /// Start offset in the source file
        offset: u64,
        /// Number of bytes to copy
        length: u64,
    },
    /// Truncate the named file to empty, creating it if absent.
    ///
    /// Recovery housekeeping, not part of the transfer path: issued before a
    /// file's instruction replay begins so a partial destination left by an
    /// interrupted earlier attempt never survives as a corrupt prefix.
    Reset {
        /// Destination file name
        name: String,
    },
}

impl StoreRequest {
    /// Name of the destination file this request writes to
    pub fn destination(&self) -> &str {
        match self {
            Self::Append { name, .. } | Self::CopyRange { name, .. } | Self::Reset { name } => name,
        }
    }

    /// Serialize the request to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| Error::protocol(format!("failed to encode store request: {}", e)))
    }

    /// Deserialize a request from bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| Error::protocol(format!("failed to decode store request: {}", e)))
    }
}

/// The destination store's reply to a [`StoreRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreResponse {
    /// The request was applied
    Done,
    /// The request failed; the client fails the whole file and re-attempts
    /// it on a later discovery pass
    Failed {
        /// Rendered error message
        message: String,
    },
}

impl StoreResponse {
    /// Build the response for an operation outcome
    pub fn from_result(result: &Result<()>) -> Self {
        match result {
            Ok(()) => Self::Done,
            Err(e) => Self::Failed {
                message: e.to_string(),
            },
        }
    }

    /// Convert the response back into a `Result`
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Done => Ok(()),
            Self::Failed { message } => Err(Error::sync(message)),
        }
    }

    /// Serialize the response to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| Error::protocol(format!("failed to encode store response: {}", e)))
    }

    /// Deserialize a response from bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| Error::protocol(format!("failed to decode store response: {}", e)))
    }
}

/// The destination store as seen by the synchronization client.
///
/// Implementations must preserve the order of calls targeting one
/// destination file: append-based reconstruction is position dependent, so
/// replaying a file's instructions out of order corrupts its byte layout.
/// At-most-once delivery is assumed, not enforced; re-applying an operation
/// duplicates content.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Append raw bytes to the named file, creating it if absent
    async fn append(&self, name: &str, data: &[u8]) -> Result<()>;

    /// Copy `length` bytes from `source` at `offset` onto the end of `name`,
    /// creating `name` if absent.
    ///
    /// Fails with [`Error::FileNotFound`] if `source` does not exist and
    /// with [`Error::OutOfRange`] if `offset + length` exceeds the source's
    /// current length; it never silently truncates or pads.
    async fn copy_range(&self, name: &str, source: &str, offset: u64, length: u64) -> Result<()>;

    /// Truncate the named file to empty, creating it if absent
    async fn reset(&self, name: &str) -> Result<()>;
}
