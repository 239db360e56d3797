//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by a [`StorageBackend`](crate::StorageBackend).
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying file operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A read asked for bytes beyond the end of the store.
    #[error("read beyond end of storage: position {position}, len {len}, size {size}")]
    ReadPastEnd {
        /// The requested start position.
        position: u64,
        /// The requested length.
        len: usize,
        /// The store size at the time of the read.
        size: u64,
    },

    /// Truncation was asked to grow the store.
    #[error("cannot truncate to {requested} bytes, store holds only {size}")]
    TruncateBeyondEnd {
        /// The requested new size.
        requested: u64,
        /// The current size.
        size: u64,
    },
}
