//! The log facade and startup recovery.

use crate::config::Config;
use crate::dir::LogDir;
use crate::error::{CoreError, CoreResult};
use crate::index::rebuild_index;
use crate::segment::{Segment, SegmentInfo};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use tracing::{info, trace, warn};

/// A durable, append-only log of opaque records.
///
/// Records are addressed by logical offsets assigned from 0 upwards, one per
/// append, with no gaps. The log owns an ordered list of [`Segment`]s; the
/// last one is the only one that accepts appends.
///
/// # Locking
///
/// A single reader/writer lock guards the whole log. An append holds it
/// exclusively from offset assignment until both files are written (and
/// synced, with `sync_on_append`), so appends are totally ordered and a read
/// that starts after an append returns sees that append. Reads share the
/// lock and run in parallel.
///
/// # Opening a Log
///
/// ```rust,no_run
/// use seglog_core::Log;
/// use std::path::Path;
///
/// let log = Log::open(Path::new("/var/lib/seglog"))?;
/// let offset = log.append(b"hello world")?;
/// assert_eq!(log.read(offset)?, b"hello world");
/// log.close()?;
/// # Ok::<(), seglog_core::CoreError>(())
/// ```
pub struct Log {
    config: Config,
    root: Option<PathBuf>,
    state: RwLock<LogState>,
}

struct LogState {
    /// Storage root with its lock. `None` for in-memory logs and after close.
    dir: Option<LogDir>,
    /// Sorted by base offset; never empty while open.
    segments: Vec<Segment>,
    closed: bool,
    /// Next offset as of [`Log::close`]; the segments are gone by then.
    closed_at: u64,
}

impl LogState {
    fn ensure_open(&self) -> CoreResult<()> {
        if self.closed {
            Err(CoreError::LogClosed)
        } else {
            Ok(())
        }
    }

    fn active(&mut self) -> CoreResult<&mut Segment> {
        self.segments
            .last_mut()
            .ok_or_else(|| CoreError::invalid_format("log has no segments"))
    }
}

impl Log {
    /// Opens the log stored under `root` with the default configuration.
    ///
    /// # Errors
    ///
    /// See [`Log::open_with_config`].
    pub fn open(root: &Path) -> CoreResult<Self> {
        Self::open_with_config(root, Config::default())
    }

    /// Opens the log stored under `root`.
    ///
    /// Startup runs in a fixed order:
    /// 1. take the lock on `root` (creating it if allowed)
    /// 2. discover the data files and parse their base offsets
    /// 3. rebuild every index from its data file, lowest base first
    /// 4. open the segments
    ///
    /// A root without data files gets one empty segment at base offset 0.
    ///
    /// # Errors
    ///
    /// Any failure aborts the open; there is no partially recovered log.
    /// - [`CoreError::LogLocked`] if another process has the root open
    /// - [`CoreError::InvalidSegmentName`] for a data file not named by its base offset
    /// - [`CoreError::TruncatedRecord`] for a torn data file under the strict policy
    /// - I/O and storage errors
    pub fn open_with_config(root: &Path, config: Config) -> CoreResult<Self> {
        let dir = LogDir::open(root, config.create_if_missing)?;
        let base_offsets = dir.discover_base_offsets()?;

        let segments = if base_offsets.is_empty() {
            let segment = Segment::open(&dir, 0, &config)?;
            dir.sync()?;
            vec![segment]
        } else {
            let mut segments = Vec::with_capacity(base_offsets.len());
            for base_offset in base_offsets {
                rebuild_index(&dir.data_path(base_offset), config.recovery_policy)?;
                segments.push(Segment::open(&dir, base_offset, &config)?);
            }
            segments
        };

        warn_on_discontinuity(&segments);

        let log = Self {
            config,
            root: Some(root.to_path_buf()),
            state: RwLock::new(LogState {
                dir: Some(dir),
                segments,
                closed: false,
                closed_at: 0,
            }),
        };

        info!(
            root = %root.display(),
            segments = log.segment_count(),
            next_offset = log.next_offset(),
            "log opened"
        );
        Ok(log)
    }

    /// Opens an empty log that lives only in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial segment cannot be created.
    pub fn open_in_memory(config: Config) -> CoreResult<Self> {
        let segment = Segment::in_memory(0, &config)?;
        Ok(Self {
            config,
            root: None,
            state: RwLock::new(LogState {
                dir: None,
                segments: vec![segment],
                closed: false,
                closed_at: 0,
            }),
        })
    }

    /// Appends a record and returns its offset.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LogClosed`] after [`Log::close`], or the error
    /// that stopped the write. A failed append consumes no offset.
    pub fn append(&self, payload: &[u8]) -> CoreResult<u64> {
        let mut state = self.state.write();
        state.ensure_open()?;

        if let Some(max) = self.config.max_segment_bytes {
            let active = state.active()?;
            if !active.is_empty() && active.data_size()? >= max {
                self.rotate(&mut state)?;
            }
        }

        let offset = state.active()?.append(payload)?;
        trace!(offset, len = payload.len(), "appended record");
        Ok(offset)
    }

    /// Seals the active segment and opens a new one where it left off.
    fn rotate(&self, state: &mut LogState) -> CoreResult<()> {
        let active = state.active()?;
        active.sync()?;
        let sealed_base = active.base_offset();
        let next_base = active.next_offset();

        let segment = match &state.dir {
            Some(dir) => {
                let segment = Segment::open(dir, next_base, &self.config)?;
                dir.sync()?;
                segment
            }
            None => Segment::in_memory(next_base, &self.config)?,
        };
        state.segments.push(segment);

        info!(sealed_base, next_base, "rotated active segment");
        Ok(())
    }

    /// Reads the record at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::OffsetNotFound`] if no append has produced
    /// `offset`, [`CoreError::LogClosed`] after [`Log::close`], or an I/O
    /// error.
    pub fn read(&self, offset: u64) -> CoreResult<Vec<u8>> {
        let state = self.state.read();
        state.ensure_open()?;

        state
            .segments
            .iter()
            .find(|segment| segment.contains(offset))
            .ok_or(CoreError::OffsetNotFound { offset })?
            .read(offset)
    }

    /// Offset the next append will receive.
    ///
    /// After [`Log::close`] this is the offset the log ended at, so it never
    /// goes backwards.
    #[must_use]
    pub fn next_offset(&self) -> u64 {
        let state = self.state.read();
        if state.closed {
            return state.closed_at;
        }
        state.segments.last().map_or(0, Segment::next_offset)
    }

    /// Number of segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.state.read().segments.len()
    }

    /// Describes every segment, lowest base offset first.
    ///
    /// # Errors
    ///
    /// Returns an error if a file size cannot be determined.
    pub fn segments(&self) -> CoreResult<Vec<SegmentInfo>> {
        let state = self.state.read();
        state.ensure_open()?;
        state.segments.iter().map(Segment::info).collect()
    }

    /// The storage root, or `None` for an in-memory log.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// The configuration the log was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Forces every segment to stable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the log is closed or a sync fails.
    pub fn sync(&self) -> CoreResult<()> {
        let mut state = self.state.write();
        state.ensure_open()?;
        for segment in &mut state.segments {
            segment.sync()?;
        }
        Ok(())
    }

    /// Syncs and closes every segment and releases the storage root lock.
    ///
    /// Later calls other than `close` fail with [`CoreError::LogClosed`].
    /// Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the first sync failure. Every handle is released regardless.
    pub fn close(&self) -> CoreResult<()> {
        let mut state = self.state.write();
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        let closed_at = state.segments.last().map_or(0, Segment::next_offset);
        state.closed_at = closed_at;

        let mut result = Ok(());
        for segment in std::mem::take(&mut state.segments) {
            let closed = segment.close();
            if result.is_ok() {
                result = closed;
            }
        }
        state.dir = None;

        info!("log closed");
        result
    }

    /// Whether [`Log::close`] has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.read().closed
    }
}

/// Segments are expected to tile the offset space. A gap or overlap means
/// files were copied in by hand; reads still route to the first segment
/// whose range holds the offset.
fn warn_on_discontinuity(segments: &[Segment]) {
    for pair in segments.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if prev.next_offset() != next.base_offset() {
            warn!(
                prev_base = prev.base_offset(),
                prev_next = prev.next_offset(),
                next_base = next.base_offset(),
                "segments do not line up"
            );
        }
    }
}

impl std::fmt::Debug for Log {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Log")
            .field("root", &self.root)
            .field("segments", &self.segment_count())
            .field("next_offset", &self.next_offset())
            .finish_non_exhaustive()
    }
}

impl Drop for Log {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(error = %err, "failed to close log on drop");
        }
    }
}
