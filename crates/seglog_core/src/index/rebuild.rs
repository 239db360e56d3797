//! Index regeneration from a data file.

use crate::config::RecoveryPolicy;
use crate::dir::{index_file_name, parse_base_offset};
use crate::error::{CoreError, CoreResult};
use crate::index::scanner::RecordScanner;
use crate::segment::{IndexEntry, INDEX_ENTRY_SIZE};
use seglog_storage::{FileBackend, StorageBackend};
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Entries buffered before each index append.
const ENTRIES_PER_BATCH: usize = 4096;

/// What a rebuild found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RebuildOutcome {
    /// Number of records indexed.
    pub entries: u64,
    /// Data file length after recovery.
    pub data_len: u64,
    /// Bytes of torn tail cut from the data file.
    pub truncated_bytes: u64,
}

/// Regenerates `index` from `data`, discarding whatever `index` held.
///
/// `base_offset` only labels errors and log lines; index entries carry
/// offsets relative to the segment.
///
/// # Errors
///
/// - [`CoreError::TruncatedRecord`] if `data` ends inside a record and the
///   policy is [`RecoveryPolicy::Strict`]
/// - [`CoreError::SegmentFull`] if the data holds more records than a
///   4-byte relative offset can address
/// - storage errors from either backend
pub fn rebuild_into(
    base_offset: u64,
    data: &mut dyn StorageBackend,
    index: &mut dyn StorageBackend,
    policy: RecoveryPolicy,
) -> CoreResult<RebuildOutcome> {
    index.truncate(0)?;

    let mut batch = Vec::with_capacity(ENTRIES_PER_BATCH * INDEX_ENTRY_SIZE);
    let mut entries: u64 = 0;
    let mut valid_end: u64 = 0;
    let mut torn = false;

    for span in RecordScanner::new(&*data)? {
        let span = match span {
            Ok(span) => span,
            Err(CoreError::TruncatedRecord { position, .. })
                if policy == RecoveryPolicy::TruncateTornTail =>
            {
                debug!(base_offset, position, "torn record at end of data file");
                torn = true;
                break;
            }
            Err(err) => return Err(err),
        };

        let relative_offset =
            u32::try_from(entries).map_err(|_| CoreError::SegmentFull { base_offset })?;
        batch.extend_from_slice(&IndexEntry::new(relative_offset, span.position).encode());
        entries += 1;
        valid_end = span.end();

        if batch.len() >= ENTRIES_PER_BATCH * INDEX_ENTRY_SIZE {
            index.append(&batch)?;
            batch.clear();
        }
    }

    index.append(&batch)?;
    index.sync()?;

    let size = data.size()?;
    let truncated_bytes = if torn {
        warn!(
            base_offset,
            kept = valid_end,
            dropped = size - valid_end,
            "truncating torn tail of data file"
        );
        data.truncate(valid_end)?;
        size - valid_end
    } else {
        0
    };

    Ok(RebuildOutcome {
        entries,
        data_len: size - truncated_bytes,
        truncated_bytes,
    })
}

/// Regenerates the index file that belongs to the data file at `data_path`.
///
/// The base offset comes from the file name, and the index file
/// (`<base>.index`, next to the data file) is recreated from scratch.
///
/// # Errors
///
/// Returns [`CoreError::InvalidSegmentName`] for a data file that is not
/// named by its base offset, an I/O error if it does not exist, and
/// everything [`rebuild_into`] returns.
pub fn rebuild_index(data_path: &Path, policy: RecoveryPolicy) -> CoreResult<RebuildOutcome> {
    let base_offset = parse_base_offset(data_path)?;
    if !data_path.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("data file not found: {}", data_path.display()),
        )
        .into());
    }

    let index_path = data_path.with_file_name(index_file_name(base_offset));
    let mut data = FileBackend::open(data_path)?;
    let mut index = FileBackend::create(&index_path)?;

    let outcome = rebuild_into(base_offset, &mut data, &mut index, policy)?;
    debug!(
        base_offset,
        entries = outcome.entries,
        data_len = outcome.data_len,
        "rebuilt index"
    );
    Ok(outcome)
}
