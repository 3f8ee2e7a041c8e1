//! Durable byte storage for refsync destinations
//!
//! A [`ByteRangeStore`] owns a destination directory of stored files, each
//! an opaque append-only byte blob keyed by name. It is the only component
//! that touches persisted file state, and it supports exactly the
//! primitives the transfer protocol needs: append raw bytes, copy a byte
//! range out of one stored file onto the end of another, and (as recovery
//! housekeeping) reset a file to empty before a fresh reconstruction
//! attempt.
//!
//! [`DirectTransport`] exposes a store through the
//! [`RemoteStore`](refsync_protocol::RemoteStore) capability so the
//! synchronization client can drive a local store exactly the way it would
//! drive a remote one, and [`StoreService`] dispatches decoded protocol
//! requests for any transport that carries them.

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod store;
mod transport;

pub use store::ByteRangeStore;
pub use transport::{DirectTransport, StoreService};
