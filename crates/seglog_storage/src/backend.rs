//! Storage backend trait definition.

use crate::error::StorageResult;

/// A positional, append-only byte store.
///
/// Each segment owns two of these: one for its records and one for its
/// position index. Backends are opaque: they never look inside the bytes
/// they hold, so the segment and index formats live entirely in
/// `seglog_core`.
///
/// # Invariants
///
/// - `append` returns the position the first appended byte landed at,
///   which is always the size of the store before the call
/// - `read_at` returns exactly the bytes previously appended at that position
/// - after `sync` returns, everything appended so far survives a crash
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadPastEnd`](crate::StorageError::ReadPastEnd)
    /// if the range is not fully inside the store, or an I/O error.
    fn read_at(&self, position: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends `data` at the end of the store and returns its position.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails. A failed append may leave a
    /// partial write behind; callers recover by truncating.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Pushes buffered writes to the operating system.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Returns the current size in bytes, which is where the next append lands.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Forces data and metadata to stable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Cuts the store down to `new_size` bytes.
    ///
    /// Used to reset an index before it is rebuilt and to drop a torn
    /// record from the tail of a data file.
    ///
    /// # Errors
    ///
    /// Returns an error if `new_size` is larger than the current size or
    /// the truncation fails.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;
}
