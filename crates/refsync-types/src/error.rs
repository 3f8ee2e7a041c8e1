//! Error types and handling for refsync
//!
//! Every failure surfaced across a crate boundary in refsync is one of the
//! variants defined here. Storage and protocol failures are reported to the
//! synchronization client, which fails the affected file and re-attempts it
//! on a later discovery pass; retryability at that file granularity is
//! captured by [`Error::is_retryable`].

/// Main error type for refsync operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        /// Error message from the I/O operation
        message: String,
    },

    /// A stored file referenced by an operation does not exist
    #[error("stored file not found: {name}")]
    FileNotFound {
        /// Name of the stored file that was not found
        name: String,
    },

    /// A range-copy request reached beyond the source file's current length
    #[error(
        "range [{offset}, {offset}+{length}) out of bounds for '{name}' (current length {available})"
    )]
    OutOfRange {
        /// Name of the source file
        name: String,
        /// Requested start offset
        offset: u64,
        /// Requested number of bytes
        length: u64,
        /// Current length of the source file
        available: u64,
    },

    /// Configuration error
    #[error("configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },

    /// Protocol encoding or decoding error
    #[error("protocol error: {message}")]
    Protocol {
        /// Error message describing the protocol issue
        message: String,
    },

    /// Synchronization error
    #[error("synchronization error: {message}")]
    Sync {
        /// Error message describing the synchronization issue
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// I/O related errors, including missing files and bad ranges
    Io,
    /// Configuration errors
    Config,
    /// Protocol errors
    Protocol,
    /// Synchronization errors
    Sync,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } | Self::FileNotFound { .. } | Self::OutOfRange { .. } => ErrorKind::Io,
            Self::Config { .. } => ErrorKind::Config,
            Self::Protocol { .. } => ErrorKind::Protocol,
            Self::Sync { .. } => ErrorKind::Sync,
        }
    }

    /// Check if the failed file is eligible for a full re-attempt on a later
    /// discovery pass.
    ///
    /// Transport-surfaced failures are retryable at file granularity: the
    /// client never retries a single instruction, it re-synchronizes the
    /// whole file from scratch. Configuration errors are not retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Io { .. }
            | Self::FileNotFound { .. }
            | Self::OutOfRange { .. }
            | Self::Protocol { .. }
            | Self::Sync { .. } => true,
            Self::Config { .. } => false,
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new protocol error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a new synchronization error
    pub fn sync<S: Into<String>>(message: S) -> Self {
        Self::Sync {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}
