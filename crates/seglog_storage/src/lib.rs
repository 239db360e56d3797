//! # seglog storage
//!
//! Byte-store backends underneath the seglog segment files.
//!
//! A segment is backed by two stores: the data store holding the
//! length-prefixed records and the position index. Neither backend knows
//! about that layout. They read, append, sync and truncate raw bytes and
//! nothing else; `seglog_core` owns every byte of format interpretation.
//!
//! ## Available Backends
//!
//! - [`FileBackend`] - a file on disk, used by every persistent segment
//! - [`InMemoryBackend`] - a shared in-memory buffer for tests and ephemeral logs
//!
//! ## Example
//!
//! ```rust
//! use seglog_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let position = backend.append(b"hello world").unwrap();
//! let data = backend.read_at(position, 11).unwrap();
//! assert_eq!(&data, b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
