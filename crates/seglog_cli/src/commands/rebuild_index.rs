//! Rebuild-index command implementation.

use seglog_core::{rebuild_index, LogDir, RebuildOutcome, RecoveryPolicy};
use std::path::Path;

/// Regenerates the index of every segment under `path`.
///
/// Returns the base offset and outcome of each rebuild, lowest base first.
pub fn rebuild_all(
    path: &Path,
    policy: RecoveryPolicy,
) -> Result<Vec<(u64, RebuildOutcome)>, Box<dyn std::error::Error>> {
    let dir = LogDir::open(path, false)?;
    let mut outcomes = Vec::new();
    for base_offset in dir.discover_base_offsets()? {
        let outcome = rebuild_index(&dir.data_path(base_offset), policy)?;
        outcomes.push((base_offset, outcome));
    }
    Ok(outcomes)
}

/// Runs the rebuild-index command.
pub fn run(path: &Path, policy: RecoveryPolicy) -> Result<(), Box<dyn std::error::Error>> {
    println!("Rebuilding indexes at {:?}", path);
    println!();

    let outcomes = rebuild_all(path, policy)?;
    for (base_offset, outcome) in &outcomes {
        print!(
            "  segment {}: {} records, {} data bytes",
            base_offset, outcome.entries, outcome.data_len
        );
        if outcome.truncated_bytes > 0 {
            print!(", {} torn bytes cut", outcome.truncated_bytes);
        }
        println!();
    }

    println!();
    println!("✓ Rebuilt {} index file(s)", outcomes.len());
    Ok(())
}
