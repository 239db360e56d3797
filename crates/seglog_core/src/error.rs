//! Error types for the seglog engine.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while opening, appending to or reading a log.
///
/// Per-call failures ([`CoreError::OffsetNotFound`], I/O) are ordinary
/// results. Recovery failures ([`CoreError::InvalidSegmentName`],
/// [`CoreError::TruncatedRecord`]) abort [`Log::open`](crate::Log::open):
/// the log never starts with only part of its segments available.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] seglog_storage::StorageError),

    /// I/O error outside a backend (directory listing, lock file).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A data file name does not parse as a base offset.
    #[error("invalid segment file name: {name}")]
    InvalidSegmentName {
        /// The offending file name.
        name: String,
    },

    /// A data file ends in the middle of a record.
    #[error(
        "truncated record at byte {position}: needed {needed} bytes, {available} available"
    )]
    TruncatedRecord {
        /// Byte position of the record's length prefix.
        position: u64,
        /// Bytes the record claims to occupy, prefix included.
        needed: u64,
        /// Bytes left in the file from `position`.
        available: u64,
    },

    /// No segment holds the requested offset.
    #[error("offset {offset} not found")]
    OffsetNotFound {
        /// The requested logical offset.
        offset: u64,
    },

    /// The position index disagrees with the data file.
    #[error("index corruption: {message}")]
    IndexCorruption {
        /// Description of the disagreement.
        message: String,
    },

    /// A segment cannot address another record with a 4-byte relative offset.
    #[error("segment at base offset {base_offset} is full")]
    SegmentFull {
        /// Base offset of the full segment.
        base_offset: u64,
    },

    /// Another process holds the storage root lock.
    #[error("log locked: another process has exclusive access")]
    LogLocked,

    /// The log was closed.
    #[error("log is closed")]
    LogClosed,

    /// The storage root is unusable.
    #[error("invalid log format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid segment name error.
    pub fn invalid_segment_name(name: impl Into<String>) -> Self {
        Self::InvalidSegmentName { name: name.into() }
    }

    /// Creates an index corruption error.
    pub fn index_corruption(message: impl Into<String>) -> Self {
        Self::IndexCorruption {
            message: message.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Returns true for the not-found condition callers are expected to handle.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::OffsetNotFound { .. })
    }
}
