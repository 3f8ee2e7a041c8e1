//! Synchronization orchestration for refsync
//!
//! The [`SyncClient`] watches a source directory and uploads every new file
//! to a destination store, delta-encoded against the files it has already
//! synchronized. Per file, the client:
//!
//! 1. reads the candidate fully into memory,
//! 2. runs the matcher against every reference-corpus entry in corpus
//!    order and plans the reconstruction instruction list,
//! 3. replays the instructions strictly in order against the destination
//!    store through the [`RemoteStore`](refsync_protocol::RemoteStore)
//!    capability,
//! 4. on success, adds the file to the reference corpus so later files can
//!    copy from it; on failure, leaves it unsynced for a full re-attempt on
//!    the next discovery pass.
//!
//! Synchronization state lives in memory only and is lost on restart; a
//! restarted client rediscovers everything and rebuilds the destination.

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod client;
mod corpus;
mod watcher;

pub use client::{FileReport, SyncClient, SyncConfig, SyncPhase};
pub use corpus::{CorpusEntry, ReferenceCorpus, SyncState};
pub use watcher::DirWatcher;
