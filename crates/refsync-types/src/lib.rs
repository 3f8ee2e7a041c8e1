//! Core type system and error handling for refsync
//!
//! This crate provides the foundational types shared by every refsync crate:
//!
//! - **Error handling**: structured error types covering storage, protocol,
//!   and synchronization failures, with retryability classification
//! - **Result alias**: the common `Result<T>` used throughout the workspace
//! - **Transfer statistics**: accounting for literal vs. copied bytes, used
//!   to report how much transfer volume delta encoding saved
//!
//! # Examples
//!
//! ```rust
//! use refsync_types::{Error, Result, TransferStats};
//!
//! fn example_operation() -> Result<TransferStats> {
//!     let mut stats = TransferStats::new();
//!     stats.files_synced = 1;
//!     stats.literal_bytes = 512;
//!     stats.copied_bytes = 4096;
//!     Ok(stats)
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod result;
pub mod stats;

pub use error::{Error, ErrorKind};
pub use result::Result;
pub use stats::TransferStats;
