//! Position index recovery.
//!
//! The position index of a segment is a cache over its data file. It holds
//! nothing the data file does not, so recovery never trusts it: every open
//! discards the index and regenerates it with a forward scan of the data.
//!
//! ## Recovery Policy
//!
//! - **Clean end**: the scan stops exactly at end of file. Success.
//! - **Torn record**: the file ends inside a length prefix or inside a
//!   payload. With [`RecoveryPolicy::Strict`](crate::RecoveryPolicy::Strict)
//!   this is [`CoreError::TruncatedRecord`](crate::CoreError::TruncatedRecord)
//!   and the segment does not open. With
//!   [`RecoveryPolicy::TruncateTornTail`](crate::RecoveryPolicy::TruncateTornTail)
//!   the partial record is cut from the data file and the scan result stands.
//!
//! ## Invariants
//!
//! - The n-th record of a segment gets the entry `(n, position)`
//! - Rebuilding the same data file twice yields byte-identical indexes

mod rebuild;
mod scanner;

pub use rebuild::{rebuild_index, rebuild_into, RebuildOutcome};
pub use scanner::{RecordScanner, RecordSpan};
