//! # seglog core
//!
//! The segment and index engine behind seglog, a durable append-only log.
//!
//! Callers append opaque byte records and get back sequential logical
//! offsets; they read a record back by its offset. Underneath:
//! - [`Log`] owns the segments, routes appends and reads, and recovers on open
//! - [`Segment`] holds one offset range as a data file plus a position index
//! - [`index`] regenerates position indexes from data files, the only
//!   crash-recovery step the log needs
//! - [`dir`] lays out and discovers segment files under the storage root
//!
//! ## Example
//!
//! ```rust
//! use seglog_core::{Config, Log};
//!
//! let log = Log::open_in_memory(Config::default())?;
//! assert_eq!(log.append(b"hello world")?, 0);
//! assert_eq!(log.append(b"")?, 1);
//! assert_eq!(log.read(0)?, b"hello world");
//! assert!(log.read(100).unwrap_err().is_not_found());
//! # Ok::<(), seglog_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
pub mod dir;
mod error;
pub mod index;
mod log;
pub mod segment;

pub use config::{Config, RecoveryPolicy};
pub use dir::LogDir;
pub use error::{CoreError, CoreResult};
pub use index::{rebuild_index, rebuild_into, RebuildOutcome};
pub use log::Log;
pub use segment::{IndexEntry, Segment, SegmentInfo};

/// Crate version, as reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
