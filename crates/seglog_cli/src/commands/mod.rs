//! CLI command implementations.

pub mod frontend;
pub mod inspect;
pub mod rebuild_index;
pub mod shell;
pub mod verify;
