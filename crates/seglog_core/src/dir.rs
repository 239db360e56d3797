//! Storage root layout and file discovery.
//!
//! A log lives flat in one directory:
//!
//! ```text
//! <root>/
//! ├─ LOCK              # Advisory lock, one writer process per root
//! ├─ 0.store           # Data file of the segment based at offset 0
//! ├─ 0.index           # Its position index
//! ├─ 1000.store        # Next segment (only with rotation enabled)
//! └─ 1000.index
//! ```
//!
//! Segment files are named by their base offset in plain decimal. Only the
//! `.store` files are authoritative; `.index` files are rebuilt from them
//! on every open.

use crate::error::{CoreError, CoreResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix of segment data files.
pub const DATA_FILE_SUFFIX: &str = ".store";

/// Suffix of position index files.
pub const INDEX_FILE_SUFFIX: &str = ".index";

const LOCK_FILE: &str = "LOCK";

/// Returns the data file name for a segment based at `base_offset`.
#[must_use]
pub fn data_file_name(base_offset: u64) -> String {
    format!("{base_offset}{DATA_FILE_SUFFIX}")
}

/// Returns the index file name for a segment based at `base_offset`.
#[must_use]
pub fn index_file_name(base_offset: u64) -> String {
    format!("{base_offset}{INDEX_FILE_SUFFIX}")
}

/// Parses the base offset out of a data file path such as `/var/log/42.store`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidSegmentName`] if the file name does not end
/// with [`DATA_FILE_SUFFIX`] or the rest is not a canonical decimal `u64`.
pub fn parse_base_offset(path: &Path) -> CoreResult<u64> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CoreError::invalid_segment_name(path.display().to_string()))?;

    // Only the canonical spelling counts: "+5.store" or "05.store" would
    // parse, but the segment would then be reopened as "5.store".
    name.strip_suffix(DATA_FILE_SUFFIX)
        .and_then(|stem| stem.parse::<u64>().ok())
        .filter(|base| data_file_name(*base) == name)
        .ok_or_else(|| CoreError::invalid_segment_name(name))
}

/// Lists the files directly inside `root` whose name ends with `suffix`,
/// sorted by path.
///
/// Symlinks are followed, so a symlinked segment file is listed. Matching
/// names that resolve to anything other than a file (directories, dangling
/// links) are skipped with a `debug!` line. The listing does not descend
/// into subdirectories.
///
/// # Errors
///
/// Returns an error if `root` cannot be read.
pub fn list_files_with_suffix(root: &Path, suffix: &str) -> CoreResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(suffix));
        if !matches {
            continue;
        }

        let path = entry.path();
        if path.is_file() {
            files.push(path);
        } else {
            debug!(path = %path.display(), "skipping non-file entry");
        }
    }

    files.sort();
    Ok(files)
}

/// The storage root of a log, held under an exclusive lock.
///
/// Only one `LogDir` can exist per directory at a time, across processes.
/// The lock is released when the value is dropped.
#[derive(Debug)]
pub struct LogDir {
    path: PathBuf,
    _lock_file: File,
}

impl LogDir {
    /// Opens the storage root at `path`, taking its lock.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `create_if_missing` is false
    /// - `path` is not a directory
    /// - Another process holds the lock (`LogLocked`)
    /// - I/O errors occur
    pub fn open(path: &Path, create_if_missing: bool) -> CoreResult<Self> {
        if !path.exists() {
            if create_if_missing {
                fs::create_dir_all(path)?;
            } else {
                return Err(CoreError::invalid_format(format!(
                    "log directory does not exist: {}",
                    path.display()
                )));
            }
        }

        if !path.is_dir() {
            return Err(CoreError::invalid_format(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(CoreError::LogLocked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the storage root.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the data file path of the segment based at `base_offset`.
    #[must_use]
    pub fn data_path(&self, base_offset: u64) -> PathBuf {
        self.path.join(data_file_name(base_offset))
    }

    /// Returns the index file path of the segment based at `base_offset`.
    #[must_use]
    pub fn index_path(&self, base_offset: u64) -> PathBuf {
        self.path.join(index_file_name(base_offset))
    }

    /// Finds every data file in the root and returns their base offsets,
    /// ascending.
    ///
    /// # Errors
    ///
    /// Fails on the first data file whose name is not a base offset; a
    /// log with an ambiguous offset space is not opened at all.
    pub fn discover_base_offsets(&self) -> CoreResult<Vec<u64>> {
        let mut offsets = list_files_with_suffix(&self.path, DATA_FILE_SUFFIX)?
            .iter()
            .map(|path| parse_base_offset(path))
            .collect::<CoreResult<Vec<_>>>()?;
        offsets.sort_unstable();
        Ok(offsets)
    }

    /// Fsyncs the directory so newly created segment files survive a crash.
    #[cfg(unix)]
    pub fn sync(&self) -> CoreResult<()> {
        File::open(&self.path)?.sync_all()?;
        Ok(())
    }

    /// Directory fsync is not available here; NTFS journals metadata.
    #[cfg(not(unix))]
    pub fn sync(&self) -> CoreResult<()> {
        Ok(())
    }
}
