//! Append and lookup within one segment.

use crate::config::Config;
use crate::dir::LogDir;
use crate::error::{CoreError, CoreResult};
use crate::index::rebuild_into;
use crate::segment::record::{
    decode_length_prefix, encode_record, IndexEntry, INDEX_ENTRY_SIZE, LENGTH_PREFIX_SIZE,
};
use seglog_storage::{FileBackend, InMemoryBackend, StorageBackend};
use tracing::{debug, warn};

/// Index entries read per chunk by the fallback scan.
const SCAN_CHUNK_ENTRIES: usize = 1024;

/// A point-in-time description of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentInfo {
    /// First offset of the segment.
    pub base_offset: u64,
    /// Offset the next append would receive.
    pub next_offset: u64,
    /// Size of the data file in bytes.
    pub data_bytes: u64,
    /// Size of the index file in bytes.
    pub index_bytes: u64,
}

impl SegmentInfo {
    /// Number of records in the segment.
    #[must_use]
    pub const fn records(&self) -> u64 {
        self.next_offset - self.base_offset
    }
}

/// One segment of the log.
///
/// A segment is not synchronized internally; the [`Log`](crate::Log) holding
/// it serializes appends against reads. `append` takes `&mut self`, `read`
/// takes `&self`, so the borrow rules carry the same discipline for
/// standalone use.
pub struct Segment {
    base_offset: u64,
    next_offset: u64,
    data: Box<dyn StorageBackend>,
    index: Box<dyn StorageBackend>,
    sync_on_append: bool,
}

impl Segment {
    /// Opens the segment based at `base_offset` in `dir`, creating its
    /// files if they are missing.
    ///
    /// The index file is rebuilt from the data file before the segment is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be opened or recovery fails.
    pub fn open(dir: &LogDir, base_offset: u64, config: &Config) -> CoreResult<Self> {
        let data = FileBackend::open(&dir.data_path(base_offset))?;
        let index = FileBackend::open(&dir.index_path(base_offset))?;
        Self::with_backends(base_offset, Box::new(data), Box::new(index), config)
    }

    /// Opens an empty segment that lives only in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_offset` leaves no room for records.
    pub fn in_memory(base_offset: u64, config: &Config) -> CoreResult<Self> {
        Self::with_backends(
            base_offset,
            Box::new(InMemoryBackend::new()),
            Box::new(InMemoryBackend::new()),
            config,
        )
    }

    /// Opens a segment over arbitrary backends.
    ///
    /// Whatever `index` holds is discarded and regenerated from `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if recovery fails.
    pub fn with_backends(
        base_offset: u64,
        mut data: Box<dyn StorageBackend>,
        mut index: Box<dyn StorageBackend>,
        config: &Config,
    ) -> CoreResult<Self> {
        let outcome = rebuild_into(
            base_offset,
            data.as_mut(),
            index.as_mut(),
            config.recovery_policy,
        )?;

        let entries = index.size()? / INDEX_ENTRY_SIZE as u64;
        let next_offset = base_offset.checked_add(entries).ok_or_else(|| {
            CoreError::invalid_format(format!(
                "segment at base offset {base_offset} overflows the offset space"
            ))
        })?;

        debug!(
            base_offset,
            next_offset,
            data_len = outcome.data_len,
            "opened segment"
        );

        Ok(Self {
            base_offset,
            next_offset,
            data,
            index,
            sync_on_append: config.sync_on_append,
        })
    }

    /// First offset of this segment.
    #[must_use]
    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    /// Offset the next append will receive.
    #[must_use]
    pub fn next_offset(&self) -> u64 {
        self.next_offset
    }

    /// Number of records in the segment.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.next_offset - self.base_offset
    }

    /// Whether the segment holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.next_offset == self.base_offset
    }

    /// Whether `offset` falls inside `[base_offset, next_offset)`.
    #[must_use]
    pub fn contains(&self, offset: u64) -> bool {
        offset >= self.base_offset && offset < self.next_offset
    }

    /// Size of the data file in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    pub fn data_size(&self) -> CoreResult<u64> {
        Ok(self.data.size()?)
    }

    /// Describes the segment.
    ///
    /// # Errors
    ///
    /// Returns an error if a file size cannot be determined.
    pub fn info(&self) -> CoreResult<SegmentInfo> {
        Ok(SegmentInfo {
            base_offset: self.base_offset,
            next_offset: self.next_offset,
            data_bytes: self.data.size()?,
            index_bytes: self.index.size()?,
        })
    }

    /// Appends a record and returns its absolute offset.
    ///
    /// The record goes to the end of the data file and its entry to the end
    /// of the index. If either write (or the sync that follows it, when
    /// `sync_on_append` is set) fails, both files are cut back to their
    /// previous length and no offset is consumed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SegmentFull`] once the segment holds 2^32
    /// records, or the storage error that stopped the write.
    pub fn append(&mut self, payload: &[u8]) -> CoreResult<u64> {
        let relative_offset = u32::try_from(self.next_offset - self.base_offset).map_err(|_| {
            CoreError::SegmentFull {
                base_offset: self.base_offset,
            }
        })?;
        if self.next_offset == u64::MAX {
            return Err(CoreError::SegmentFull {
                base_offset: self.base_offset,
            });
        }

        let data_len = self.data.size()?;
        let index_len = self.index.size()?;

        if let Err(err) = self.write_record(relative_offset, payload) {
            self.roll_back(data_len, index_len);
            return Err(err);
        }

        let offset = self.next_offset;
        self.next_offset += 1;
        Ok(offset)
    }

    fn write_record(&mut self, relative_offset: u32, payload: &[u8]) -> CoreResult<()> {
        let position = self.data.append(&encode_record(payload))?;
        self.index
            .append(&IndexEntry::new(relative_offset, position).encode())?;

        if self.sync_on_append {
            self.data.sync()?;
            self.index.sync()?;
        }
        Ok(())
    }

    fn roll_back(&mut self, data_len: u64, index_len: u64) {
        for (name, backend, len) in [
            ("data", &mut self.data, data_len),
            ("index", &mut self.index, index_len),
        ] {
            let restore = match backend.size() {
                Ok(size) if size > len => backend.truncate(len),
                Ok(_) => Ok(()),
                Err(err) => Err(err),
            };
            if let Err(err) = restore {
                // The next open rebuilds the index from the data file.
                warn!(
                    base_offset = self.base_offset,
                    file = name,
                    error = %err,
                    "failed to roll back partial append"
                );
            }
        }
    }

    /// Reads the record at absolute `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::OffsetNotFound`] if the offset is outside this
    /// segment or no index entry carries it, and
    /// [`CoreError::IndexCorruption`] if the index points outside the data
    /// file.
    pub fn read(&self, offset: u64) -> CoreResult<Vec<u8>> {
        if !self.contains(offset) {
            return Err(CoreError::OffsetNotFound { offset });
        }
        let relative_offset = offset - self.base_offset;

        let entry = match self.entry_at(relative_offset)? {
            Some(entry) if u64::from(entry.relative_offset) == relative_offset => entry,
            _ => self
                .scan_for(relative_offset)?
                .ok_or(CoreError::OffsetNotFound { offset })?,
        };

        self.read_record(entry.position)
    }

    /// Returns the entry stored in slot `relative_offset` of the index.
    fn entry_at(&self, relative_offset: u64) -> CoreResult<Option<IndexEntry>> {
        let Some(start) = relative_offset.checked_mul(INDEX_ENTRY_SIZE as u64) else {
            return Ok(None);
        };
        if start + INDEX_ENTRY_SIZE as u64 > self.index.size()? {
            return Ok(None);
        }

        let bytes = self.index.read_at(start, INDEX_ENTRY_SIZE)?;
        IndexEntry::decode(&bytes).map(Some)
    }

    /// Walks the index from the start looking for `relative_offset`.
    ///
    /// Only reached when the slot lookup disagrees with the entry it finds.
    fn scan_for(&self, relative_offset: u64) -> CoreResult<Option<IndexEntry>> {
        let size = self.index.size()?;
        let whole = size - size % INDEX_ENTRY_SIZE as u64;
        let chunk = (SCAN_CHUNK_ENTRIES * INDEX_ENTRY_SIZE) as u64;

        let mut position = 0;
        while position < whole {
            let len = chunk.min(whole - position) as usize;
            let bytes = self.index.read_at(position, len)?;
            for raw in bytes.chunks_exact(INDEX_ENTRY_SIZE) {
                let entry = IndexEntry::decode(raw)?;
                if u64::from(entry.relative_offset) == relative_offset {
                    return Ok(Some(entry));
                }
            }
            position += len as u64;
        }

        Ok(None)
    }

    fn read_record(&self, position: u64) -> CoreResult<Vec<u8>> {
        let data_len = self.data.size()?;
        let payload_start = position.saturating_add(LENGTH_PREFIX_SIZE as u64);
        if payload_start > data_len {
            return Err(CoreError::index_corruption(format!(
                "segment {}: record position {position} beyond data length {data_len}",
                self.base_offset
            )));
        }

        let payload_len = decode_length_prefix(&self.data.read_at(position, LENGTH_PREFIX_SIZE)?)?;
        if payload_len > data_len - payload_start {
            return Err(CoreError::index_corruption(format!(
                "segment {}: record at {position} claims {payload_len} bytes past end of data",
                self.base_offset
            )));
        }

        let len = usize::try_from(payload_len).map_err(|_| {
            CoreError::index_corruption(format!("record length {payload_len} exceeds memory"))
        })?;
        Ok(self.data.read_at(payload_start, len)?)
    }

    /// Forces both files to stable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if either sync fails.
    pub fn sync(&mut self) -> CoreResult<()> {
        self.data.sync()?;
        self.index.sync()?;
        Ok(())
    }

    /// Syncs both files and releases their handles.
    ///
    /// # Errors
    ///
    /// Returns an error if the final sync fails; the handles are released
    /// either way.
    pub fn close(mut self) -> CoreResult<()> {
        self.sync()
    }
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segment")
            .field("base_offset", &self.base_offset)
            .field("next_offset", &self.next_offset)
            .field("sync_on_append", &self.sync_on_append)
            .finish_non_exhaustive()
    }
}
