//! On-disk encoding of records and index entries.
//!
//! Both encodings are big-endian and carry no header, magic or checksum;
//! the files are plain concatenations of these units.

use crate::error::{CoreError, CoreResult};

/// Size of the record length prefix in the data file.
pub const LENGTH_PREFIX_SIZE: usize = 8;

/// Size of one position index entry.
pub const INDEX_ENTRY_SIZE: usize = 12;

/// Encodes a record as it is stored in the data file: the 8-byte length
/// followed by the payload.
#[must_use]
pub fn encode_record(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    buf.extend_from_slice(&(payload.len() as u64).to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Decodes a record length prefix.
///
/// # Errors
///
/// Returns an error if `bytes` is not exactly [`LENGTH_PREFIX_SIZE`] long.
pub fn decode_length_prefix(bytes: &[u8]) -> CoreResult<u64> {
    let prefix: [u8; LENGTH_PREFIX_SIZE] = bytes.try_into().map_err(|_| {
        CoreError::invalid_format(format!(
            "length prefix must be {LENGTH_PREFIX_SIZE} bytes, got {}",
            bytes.len()
        ))
    })?;
    Ok(u64::from_be_bytes(prefix))
}

/// One entry of the position index.
///
/// ```text
/// | relative_offset (4, BE) | position (8, BE) |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Zero-based position of the record within its segment.
    pub relative_offset: u32,
    /// Byte position of the record's length prefix in the data file.
    pub position: u64,
}

impl IndexEntry {
    /// Creates a new entry.
    #[must_use]
    pub const fn new(relative_offset: u32, position: u64) -> Self {
        Self {
            relative_offset,
            position,
        }
    }

    /// Encodes the entry to its fixed 12-byte form.
    #[must_use]
    pub fn encode(&self) -> [u8; INDEX_ENTRY_SIZE] {
        let mut buf = [0u8; INDEX_ENTRY_SIZE];
        buf[..4].copy_from_slice(&self.relative_offset.to_be_bytes());
        buf[4..].copy_from_slice(&self.position.to_be_bytes());
        buf
    }

    /// Decodes an entry from exactly 12 bytes.
    ///
    /// # Errors
    ///
    /// Returns an index corruption error on a short or long slice.
    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        if bytes.len() != INDEX_ENTRY_SIZE {
            return Err(CoreError::index_corruption(format!(
                "index entry must be {INDEX_ENTRY_SIZE} bytes, got {}",
                bytes.len()
            )));
        }

        let mut rel = [0u8; 4];
        rel.copy_from_slice(&bytes[..4]);
        let mut pos = [0u8; 8];
        pos.copy_from_slice(&bytes[4..]);

        Ok(Self {
            relative_offset: u32::from_be_bytes(rel),
            position: u64::from_be_bytes(pos),
        })
    }
}
