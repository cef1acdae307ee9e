//! Error types for page archive operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when writing, reading, or reconstructing page archives,
//! along with a convenient [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`:
//!
//! ```rust,no_run
//! use pagezip::{Archive, Result};
//!
//! fn first_entry(bytes: Vec<u8>) -> Result<String> {
//!     let archive = Archive::open(bytes)?;
//!     archive.read_text("index.html")
//! }
//! ```
//!
//! ## Matching Error Categories
//!
//! ```rust
//! use pagezip::Error;
//!
//! fn print_user_message(error: &Error) {
//!     match error {
//!         Error::Io(e) => println!("File error: {}", e),
//!         e if e.is_format_error() => println!("The file is not a valid page archive."),
//!         Error::Fetch(_) => println!("Cannot open the page from the filesystem."),
//!         Error::EntryWrite { .. } => println!("The page could not be saved."),
//!         _ => println!("Error: {}", error),
//!     }
//! }
//! ```

use std::io;

/// The main error type for page archive operations.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io] | File system operations |
/// | Format | [`InvalidFormat`][Self::InvalidFormat], [`CorruptHeader`][Self::CorruptHeader], [`EntryNotFound`][Self::EntryNotFound] | Invalid container bytes |
/// | Compatibility | [`UnsupportedMethod`][Self::UnsupportedMethod] | Entry compressed with an unknown method |
/// | Integrity | [`CrcMismatch`][Self::CrcMismatch] | Data corruption |
/// | Writing | [`EntryWrite`][Self::EntryWrite], [`DuplicateEntry`][Self::DuplicateEntry] | Capture could not be archived |
/// | Bootstrap | [`Fetch`][Self::Fetch] | Archive could not read its own bytes |
/// | Transport | [`Serialization`][Self::Serialization], [`CaptureInProgress`][Self::CaptureInProgress] | Save request handling |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The byte stream has no valid container structure.
    ///
    /// Returned when no end-of-central-directory record can be found or a
    /// record signature does not match.
    #[error("Invalid page archive: {0}")]
    InvalidFormat(String),

    /// A container record is corrupt or truncated.
    #[error("Corrupt header at offset {offset:#x}: {reason}")]
    CorruptHeader {
        /// The byte offset where corruption was detected.
        offset: u64,
        /// A description of the corruption.
        reason: String,
    },

    /// The requested entry does not exist in the container.
    #[error("Entry not found: {path}")]
    EntryNotFound {
        /// The path that was requested.
        path: String,
    },

    /// The entry was compressed with a method this build cannot decode.
    ///
    /// Method `8` (deflate) requires the `deflate` feature.
    #[error("Unsupported compression method: {method}")]
    UnsupportedMethod {
        /// The ZIP method identifier.
        method: u16,
    },

    /// The CRC checksum of a decoded entry does not match the stored value.
    #[error("CRC mismatch for entry {path}: expected {expected:#x}, got {actual:#x}")]
    CrcMismatch {
        /// The entry path.
        path: String,
        /// The CRC stored in the central directory.
        expected: u32,
        /// The CRC of the decoded payload.
        actual: u32,
    },

    /// An entry path is invalid.
    ///
    /// Entry paths must not be empty, absolute, contain NUL bytes, or
    /// contain `.`/`..`/empty segments.
    #[error("Invalid archive path: {0}")]
    InvalidArchivePath(String),

    /// An entry with the same path was already added.
    #[error("Duplicate entry: {path}")]
    DuplicateEntry {
        /// The conflicting path.
        path: String,
    },

    /// Adding an entry to the archive failed.
    ///
    /// This is fatal to the current capture: no partial archive is returned.
    #[error("Failed to write entry {path}: {source}")]
    EntryWrite {
        /// The entry being written.
        path: String,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// The bootstrap could not retrieve the archive's own bytes.
    ///
    /// This is an expected limitation of hosts that disallow local file
    /// reads; it is never retried.
    #[error("Cannot fetch archive content: {0}")]
    Fetch(String),

    /// A save request arrived while another one was being processed.
    #[error("A capture is already in progress")]
    CaptureInProgress,

    /// A transport payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A compression level outside 0-9 was requested.
    #[error("Invalid compression level: {level} (valid range: 0-9)")]
    InvalidCompressionLevel {
        /// The rejected level.
        level: u32,
    },

    /// A reader or format resource limit was exceeded.
    #[error("Resource limit exceeded: {0}")]
    ResourceLimitExceeded(String),

    /// An operation was attempted in a state that does not allow it.
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),
}

impl Error {
    /// Returns whether this error means the bytes are not a usable archive.
    ///
    /// The bootstrap routes these errors to the fallback message.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFormat(_)
                | Self::CorruptHeader { .. }
                | Self::EntryNotFound { .. }
                | Self::UnsupportedMethod { .. }
                | Self::CrcMismatch { .. }
        )
    }

    /// Wraps this error as a failure to add `path` to an archive.
    pub(crate) fn into_entry_write(self, path: impl Into<String>) -> Self {
        match self {
            Self::EntryWrite { .. } => self,
            other => Self::EntryWrite {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }
}

/// A specialized Result type for page archive operations.
pub type Result<T> = std::result::Result<T, Error>;
