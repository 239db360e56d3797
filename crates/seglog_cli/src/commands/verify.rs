//! Verify command implementation.

use seglog_core::{rebuild_into, LogDir, RecoveryPolicy};
use seglog_storage::{FileBackend, InMemoryBackend};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Number of segments checked.
    pub segments_checked: usize,
    /// Number of records found in the data files.
    pub records_checked: u64,
    /// List of problems found.
    pub errors: Vec<String>,
}

impl VerifyResult {
    /// Whether every index matched its data file.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks every segment under `path` without modifying any file.
///
/// Each index is regenerated into memory from its data file and compared
/// byte for byte with the index on disk. The storage root stays locked for
/// the duration, so no log can append meanwhile.
pub fn verify(path: &Path) -> Result<VerifyResult, Box<dyn std::error::Error>> {
    let dir = LogDir::open(path, false)?;
    let mut result = VerifyResult::default();

    for base_offset in dir.discover_base_offsets()? {
        result.segments_checked += 1;

        let mut data = FileBackend::open(&dir.data_path(base_offset))?;
        let mut expected = InMemoryBackend::new();
        let outcome = match rebuild_into(
            base_offset,
            &mut data,
            &mut expected,
            RecoveryPolicy::Strict,
        ) {
            Ok(outcome) => outcome,
            Err(err) => {
                result
                    .errors
                    .push(format!("segment {base_offset}: data file unreadable: {err}"));
                continue;
            }
        };
        result.records_checked += outcome.entries;
        debug!(base_offset, entries = outcome.entries, "scanned data file");

        let index_path = dir.index_path(base_offset);
        if !index_path.exists() {
            result
                .errors
                .push(format!("segment {base_offset}: index file missing"));
            continue;
        }

        let actual = fs::read(&index_path)?;
        let expected = expected.data();
        if actual != expected {
            result.errors.push(format!(
                "segment {base_offset}: index mismatch ({} bytes on disk, {} expected)",
                actual.len(),
                expected.len()
            ));
        }
    }

    Ok(result)
}

/// Runs the verify command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying log at {:?}", path);
    println!();

    let result = verify(path)?;
    print_result(&result);

    println!();
    if result.is_ok() {
        println!("✓ Log verification passed");
        Ok(())
    } else {
        println!("✗ Log verification failed");
        Err("Verification failed".into())
    }
}

fn print_result(result: &VerifyResult) {
    println!(
        "  segments checked: {}, records: {}",
        result.segments_checked, result.records_checked
    );
    for error in &result.errors {
        println!("    ERROR: {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seglog_core::Log;
    use tempfile::tempdir;

    fn populated() -> tempfile::TempDir {
        let temp = tempdir().unwrap();
        let log = Log::open(temp.path()).unwrap();
        for word in ["alpha", "beta", "gamma"] {
            log.append(word.as_bytes()).unwrap();
        }
        log.close().unwrap();
        temp
    }

    #[test]
    fn healthy_log_verifies() {
        let temp = populated();
        let result = verify(temp.path()).unwrap();

        assert!(result.is_ok(), "{:?}", result.errors);
        assert_eq!(result.segments_checked, 1);
        assert_eq!(result.records_checked, 3);
    }

    #[test]
    fn stale_index_is_reported_and_left_alone() {
        let temp = populated();
        let index_path = temp.path().join("0.index");
        fs::write(&index_path, [0u8; 12]).unwrap();

        let result = verify(temp.path()).unwrap();
        assert!(!result.is_ok());
        assert!(result.errors[0].contains("index mismatch"));
        assert_eq!(fs::read(&index_path).unwrap(), vec![0u8; 12]);
    }

    #[test]
    fn missing_index_and_torn_data_are_reported() {
        let temp = populated();
        fs::remove_file(temp.path().join("0.index")).unwrap();
        fs::write(temp.path().join("3.store"), [0u8, 0, 0, 0, 0, 0, 0, 9, 1]).unwrap();

        let result = verify(temp.path()).unwrap();
        assert_eq!(result.segments_checked, 2);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].contains("index file missing"));
        assert!(result.errors[1].contains("data file unreadable"));
        assert!(!temp.path().join("0.index").exists());
    }

    #[test]
    fn verify_refuses_a_locked_root() {
        let temp = populated();
        let _log = Log::open(temp.path()).unwrap();
        assert!(verify(temp.path()).is_err());
    }
}
