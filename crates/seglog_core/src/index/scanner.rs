//! Forward scan over the records of a data file.
//!
//! Reads length prefixes through a fixed-size window so that a scan over a
//! file of small records costs one backend read per window rather than one
//! per record. Payload bytes are skipped, never copied.

use crate::error::{CoreError, CoreResult};
use crate::segment::{decode_length_prefix, LENGTH_PREFIX_SIZE};
use seglog_storage::StorageBackend;

/// Read window for length prefixes.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Where one record sits in a data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSpan {
    /// Byte position of the length prefix.
    pub position: u64,
    /// Payload length from the prefix.
    pub payload_len: u64,
}

impl RecordSpan {
    /// Byte position just past the payload.
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.position + LENGTH_PREFIX_SIZE as u64 + self.payload_len
    }
}

/// Iterator over the records of a data file, from position 0.
///
/// Yields one [`RecordSpan`] per complete record and stops at a clean end
/// of file. A torn record yields a single
/// [`CoreError::TruncatedRecord`] and ends the iteration.
pub struct RecordScanner<'a> {
    data: &'a dyn StorageBackend,
    size: u64,
    position: u64,
    window: Vec<u8>,
    window_start: u64,
    finished: bool,
}

impl<'a> RecordScanner<'a> {
    /// Starts a scan at the beginning of `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the size of the backend cannot be determined.
    pub fn new(data: &'a dyn StorageBackend) -> CoreResult<Self> {
        Ok(Self {
            size: data.size()?,
            data,
            position: 0,
            window: Vec::new(),
            window_start: 0,
            finished: false,
        })
    }

    /// Position the next record would start at.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    fn prefix_at(&mut self, position: u64) -> CoreResult<u64> {
        let window_end = self.window_start + self.window.len() as u64;
        if position < self.window_start || position + LENGTH_PREFIX_SIZE as u64 > window_end {
            let len = (self.size - position).min(READ_BUFFER_SIZE as u64) as usize;
            self.window = self.data.read_at(position, len)?;
            self.window_start = position;
        }

        let start = (position - self.window_start) as usize;
        decode_length_prefix(&self.window[start..start + LENGTH_PREFIX_SIZE])
    }

    fn next_span(&mut self) -> CoreResult<RecordSpan> {
        let position = self.position;
        let available = self.size - position;

        if available < LENGTH_PREFIX_SIZE as u64 {
            return Err(CoreError::TruncatedRecord {
                position,
                needed: LENGTH_PREFIX_SIZE as u64,
                available,
            });
        }

        let payload_len = self.prefix_at(position)?;
        let needed = payload_len.saturating_add(LENGTH_PREFIX_SIZE as u64);
        if needed > available {
            return Err(CoreError::TruncatedRecord {
                position,
                needed,
                available,
            });
        }

        self.position += needed;
        Ok(RecordSpan {
            position,
            payload_len,
        })
    }
}

impl Iterator for RecordScanner<'_> {
    type Item = CoreResult<RecordSpan>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.position == self.size {
            return None;
        }

        let span = self.next_span();
        if span.is_err() {
            self.finished = true;
        }
        Some(span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::encode_record;
    use seglog_storage::InMemoryBackend;

    fn data_of(payloads: &[&[u8]]) -> InMemoryBackend {
        let mut bytes = Vec::new();
        for payload in payloads {
            bytes.extend_from_slice(&encode_record(payload));
        }
        InMemoryBackend::with_data(bytes)
    }

    #[test]
    fn empty_file_yields_nothing() {
        let data = InMemoryBackend::new();
        assert_eq!(RecordScanner::new(&data).unwrap().count(), 0);
    }

    #[test]
    fn spans_follow_each_other() {
        let data = data_of(&[b"hello world", b"", b"abc"]);
        let spans: Vec<_> = RecordScanner::new(&data)
            .unwrap()
            .collect::<CoreResult<_>>()
            .unwrap();

        assert_eq!(
            spans,
            vec![
                RecordSpan { position: 0, payload_len: 11 },
                RecordSpan { position: 19, payload_len: 0 },
                RecordSpan { position: 27, payload_len: 3 },
            ]
        );
        assert_eq!(spans[2].end(), 38);
    }

    #[test]
    fn partial_prefix_is_truncation() {
        let mut bytes = encode_record(b"ok");
        bytes.extend_from_slice(&[0, 0, 0]);
        let data = InMemoryBackend::with_data(bytes);

        let results: Vec<_> = RecordScanner::new(&data).unwrap().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(CoreError::TruncatedRecord { position: 10, needed: 8, available: 3 })
        ));
    }

    #[test]
    fn short_payload_is_truncation() {
        let mut bytes = encode_record(b"complete");
        let torn = encode_record(b"interrupted");
        bytes.extend_from_slice(&torn[..12]);
        let data = InMemoryBackend::with_data(bytes);

        let mut scanner = RecordScanner::new(&data).unwrap();
        assert!(scanner.next().unwrap().is_ok());
        assert!(matches!(
            scanner.next().unwrap(),
            Err(CoreError::TruncatedRecord { position: 16, needed: 19, available: 12 })
        ));
        assert!(scanner.next().is_none());
    }

    #[test]
    fn huge_length_prefix_does_not_overflow() {
        let data = InMemoryBackend::with_data(u64::MAX.to_be_bytes().to_vec());
        let result = RecordScanner::new(&data).unwrap().next().unwrap();
        assert!(matches!(
            result,
            Err(CoreError::TruncatedRecord { needed: u64::MAX, .. })
        ));
    }

    #[test]
    fn records_straddling_the_window_are_found() {
        let payload = vec![7u8; READ_BUFFER_SIZE - 3];
        let data = data_of(&[&payload, b"tail", &payload, b""]);

        let spans: Vec<_> = RecordScanner::new(&data)
            .unwrap()
            .collect::<CoreResult<_>>()
            .unwrap();
        assert_eq!(spans.len(), 4);
        assert_eq!(spans[1].payload_len, 4);
        assert_eq!(spans[3].end(), data.size().unwrap());
    }
}
