//! File-based storage backend.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::{Mutex, RwLock};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A storage backend over a single file.
///
/// The file is opened for reading and writing; every append goes to the
/// end. The handle sits behind a mutex because a read is a seek followed
/// by a read and the two must not interleave with another caller.
///
/// # Durability
///
/// - `flush()` calls `File::flush()`, handing data to the OS
/// - `sync()` calls `File::sync_all()`, waiting for the disk
///
/// # Example
///
/// ```no_run
/// use seglog_storage::{StorageBackend, FileBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("0.store")).unwrap();
/// backend.append(b"record bytes").unwrap();
/// backend.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    file: Mutex<File>,
    size: RwLock<u64>,
}

impl FileBackend {
    /// Opens the file at `path`, creating it empty if it does not exist.
    ///
    /// Existing content is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        Self::from_file(path, file)
    }

    /// Creates the file at `path`, discarding any existing content.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Self::from_file(path, file)
    }

    /// Opens the file at `path`, creating missing parent directories first.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    fn from_file(path: &Path, file: File) -> StorageResult<Self> {
        let size = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            size: RwLock::new(size),
        })
    }

    /// Returns the path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileBackend {
    /// Cuts the file to `new_size`, then runs `sync` on it.
    ///
    /// The cached size follows the file as soon as `set_len` succeeds, so a
    /// failed sync cannot leave later appends reporting stale positions.
    fn truncate_then(
        &self,
        new_size: u64,
        sync: impl FnOnce(&File) -> io::Result<()>,
    ) -> StorageResult<()> {
        let mut size = self.size.write();
        let file = self.file.lock();

        if new_size > *size {
            return Err(StorageError::TruncateBeyondEnd {
                requested: new_size,
                size: *size,
            });
        }

        file.set_len(new_size)?;
        *size = new_size;
        sync(&*file)?;

        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn read_at(&self, position: u64, len: usize) -> StorageResult<Vec<u8>> {
        let size = *self.size.read();
        let end = position.saturating_add(len as u64);

        if position > size || end > size {
            return Err(StorageError::ReadPastEnd {
                position,
                len,
                size,
            });
        }

        if len == 0 {
            return Ok(Vec::new());
        }

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(position))?;

        let mut buffer = vec![0u8; len];
        file.read_exact(&mut buffer)?;

        Ok(buffer)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let mut size = self.size.write();
        let position = *size;

        if data.is_empty() {
            return Ok(position);
        }

        let mut file = self.file.lock();
        // The file, not the cache, says where the record lands.
        let position = file.seek(SeekFrom::End(0))?;
        *size = position;
        if let Err(err) = file.write_all(data) {
            // A short write moves the end of file; keep the cached size honest.
            if let Ok(meta) = file.metadata() {
                *size = meta.len();
            }
            return Err(err.into());
        }
        *size += data.len() as u64;

        Ok(position)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.file.lock().flush()?;
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(*self.size.read())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.file.lock().sync_all()?;
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        self.truncate_then(new_size, File::sync_all)
    }
}
