//! In-memory storage backend.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::sync::Arc;

/// A storage backend over an in-memory buffer.
///
/// Suitable for:
/// - unit tests of segment and index logic
/// - ephemeral logs that never touch the disk
///
/// The buffer can be shared: [`InMemoryBackend::share`] hands out a second
/// handle onto the same bytes, which lets a test keep a view of a segment's
/// files after the segment has taken ownership of its backends.
///
/// # Example
///
/// ```rust
/// use seglog_storage::{StorageBackend, InMemoryBackend};
///
/// let mut backend = InMemoryBackend::new();
/// let view = backend.share();
/// backend.append(b"record").unwrap();
/// assert_eq!(view.data(), b"record");
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    data: Arc<RwLock<Vec<u8>>>,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend preloaded with `data`.
    ///
    /// Useful for feeding recovery a hand-crafted data or index file.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Returns another handle onto the same buffer.
    #[must_use]
    pub fn share(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }

    /// Returns a copy of the current content.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.read().clone()
    }

    /// Replaces the whole content.
    pub fn replace(&self, data: Vec<u8>) {
        *self.data.write() = data;
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_at(&self, position: u64, len: usize) -> StorageResult<Vec<u8>> {
        let data = self.data.read();
        let size = data.len() as u64;
        let start = usize::try_from(position).unwrap_or(usize::MAX);
        let end = start.saturating_add(len);

        if position > size || end > data.len() {
            return Err(StorageError::ReadPastEnd {
                position,
                len,
                size,
            });
        }

        Ok(data[start..end].to_vec())
    }

    fn append(&mut self, new_data: &[u8]) -> StorageResult<u64> {
        let mut data = self.data.write();
        let position = data.len() as u64;
        data.extend_from_slice(new_data);
        Ok(position)
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.read().len() as u64)
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let mut data = self.data.write();
        let size = data.len() as u64;

        if new_size > size {
            return Err(StorageError::TruncateBeyondEnd {
                requested: new_size,
                size,
            });
        }

        data.truncate(new_size as usize);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn new_is_empty() {
        let backend = InMemoryBackend::new();
        assert_eq!(backend.size().unwrap(), 0);
        assert!(backend.data().is_empty());
    }

    #[test]
    fn append_returns_previous_size() {
        let mut backend = InMemoryBackend::new();

        assert_eq!(backend.append(b"hello").unwrap(), 0);
        assert_eq!(backend.append(b" world").unwrap(), 5);
        assert_eq!(backend.size().unwrap(), 11);
        assert_eq!(backend.read_at(6, 5).unwrap(), b"world");
    }

    #[test]
    fn read_extending_past_end_fails() {
        let mut backend = InMemoryBackend::new();
        backend.append(b"hello").unwrap();

        assert!(matches!(
            backend.read_at(3, 10),
            Err(StorageError::ReadPastEnd { .. })
        ));
        assert!(matches!(
            backend.read_at(10, 1),
            Err(StorageError::ReadPastEnd { .. })
        ));
    }

    #[test]
    fn shared_handles_see_each_other() {
        let mut backend = InMemoryBackend::with_data(b"abc".to_vec());
        let view = backend.share();

        backend.append(b"def").unwrap();
        assert_eq!(view.data(), b"abcdef");

        view.replace(b"xyz".to_vec());
        assert_eq!(backend.read_at(0, 3).unwrap(), b"xyz");
        assert_eq!(backend.size().unwrap(), 3);
    }

    #[test]
    fn truncate_partial_and_beyond() {
        let mut backend = InMemoryBackend::new();
        backend.append(b"hello world").unwrap();

        backend.truncate(5).unwrap();
        assert_eq!(backend.data(), b"hello");

        assert!(matches!(
            backend.truncate(100),
            Err(StorageError::TruncateBeyondEnd { requested: 100, size: 5 })
        ));
    }

    proptest! {
        #[test]
        fn appended_chunks_read_back(chunks in proptest::collection::vec(
            proptest::collection::vec(any::<u8>(), 0..64), 0..16)
        ) {
            let mut backend = InMemoryBackend::new();
            let mut placed = Vec::new();
            for chunk in &chunks {
                placed.push(backend.append(chunk).unwrap());
            }
            for (chunk, position) in chunks.iter().zip(placed) {
                prop_assert_eq!(&backend.read_at(position, chunk.len()).unwrap(), chunk);
            }
        }
    }
}
