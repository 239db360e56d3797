//! Segments: a data file plus its position index.
//!
//! A segment covers the offsets `[base_offset, next_offset)`. Its data file
//! is a concatenation of length-prefixed records and its index holds one
//! fixed-width entry per record.
//!
//! ## Data File
//!
//! ```text
//! | payload_len (8, BE) | payload (N) | payload_len (8, BE) | payload (M) | ...
//! ```
//!
//! ## Index File
//!
//! ```text
//! | relative_offset (4, BE) | position (8, BE) | ...
//! ```
//!
//! Entry `n` always describes record `n`, so the entry for a relative
//! offset sits at byte `n * 12` of the index.

mod record;
mod store;

pub use record::{
    decode_length_prefix, encode_record, IndexEntry, INDEX_ENTRY_SIZE, LENGTH_PREFIX_SIZE,
};
pub use store::{Segment, SegmentInfo};
