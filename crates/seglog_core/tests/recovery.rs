//! Recovery and round-trip properties of the log on disk.

use proptest::prelude::*;
use seglog_core::{rebuild_index, Config, CoreError, Log, RecoveryPolicy};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn payloads() -> impl Strategy<Value = Vec<Vec<u8>>> {
    proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..256), 0..24)
}

fn fill(root: &Path, records: &[Vec<u8>]) {
    let log = Log::open(root).unwrap();
    for record in records {
        log.append(record).unwrap();
    }
    log.close().unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn appends_round_trip_with_sequential_offsets(records in payloads()) {
        let temp = tempdir().unwrap();
        let config = Config::default().sync_on_append(false);
        let log = Log::open_with_config(temp.path(), config).unwrap();

        for (expected, record) in records.iter().enumerate() {
            prop_assert_eq!(log.append(record).unwrap(), expected as u64);
        }
        for (offset, record) in records.iter().enumerate() {
            prop_assert_eq!(&log.read(offset as u64).unwrap(), record);
        }

        let unknown = records.len() as u64;
        prop_assert!(
            matches!(log.read(unknown), Err(CoreError::OffsetNotFound { .. })),
            "expected OffsetNotFound for offset {}",
            unknown
        );
    }

    #[test]
    fn rebuilding_twice_gives_identical_index(records in payloads()) {
        let temp = tempdir().unwrap();
        fill(temp.path(), &records);

        let data_path = temp.path().join("0.store");
        let index_path = temp.path().join("0.index");
        let written = fs::read(&index_path).unwrap();

        rebuild_index(&data_path, RecoveryPolicy::Strict).unwrap();
        let first = fs::read(&index_path).unwrap();
        rebuild_index(&data_path, RecoveryPolicy::Strict).unwrap();
        let second = fs::read(&index_path).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first, &written);
        prop_assert_eq!(first.len(), records.len() * 12);
    }

    #[test]
    fn corrupted_index_does_not_change_reads(
        records in payloads(),
        garbage in proptest::collection::vec(any::<u8>(), 0..200),
    ) {
        let temp = tempdir().unwrap();
        fill(temp.path(), &records);
        fs::write(temp.path().join("0.index"), &garbage).unwrap();

        let log = Log::open(temp.path()).unwrap();
        prop_assert_eq!(log.next_offset(), records.len() as u64);
        for (offset, record) in records.iter().enumerate() {
            prop_assert_eq!(&log.read(offset as u64).unwrap(), record);
        }
    }
}

#[test]
fn missing_index_is_recreated() {
    let temp = tempdir().unwrap();
    fill(temp.path(), &[b"alpha".to_vec(), b"beta".to_vec()]);
    fs::remove_file(temp.path().join("0.index")).unwrap();

    let log = Log::open(temp.path()).unwrap();
    assert_eq!(log.read(1).unwrap(), b"beta");
    assert_eq!(fs::metadata(temp.path().join("0.index")).unwrap().len(), 24);
}

#[test]
fn segment_boundary_after_restart() {
    let temp = tempdir().unwrap();
    let records: Vec<Vec<u8>> = (0..5u8).map(|i| vec![i; usize::from(i)]).collect();
    fill(temp.path(), &records);

    let log = Log::open(temp.path()).unwrap();
    assert_eq!(log.read(4).unwrap(), vec![4u8; 4]);
    assert!(log.read(5).unwrap_err().is_not_found());
    assert_eq!(log.append(b"sixth").unwrap(), 5);
    assert_eq!(log.read(5).unwrap(), b"sixth");
}

#[test]
fn torn_append_is_fatal_unless_tail_truncation_is_enabled() {
    let temp = tempdir().unwrap();
    fill(temp.path(), &[b"acknowledged".to_vec()]);

    // A crash halfway through writing the next record's length prefix.
    let data_path = temp.path().join("0.store");
    let mut bytes = fs::read(&data_path).unwrap();
    bytes.extend_from_slice(&[0, 0, 0]);
    fs::write(&data_path, &bytes).unwrap();

    assert!(matches!(
        Log::open(temp.path()),
        Err(CoreError::TruncatedRecord { .. })
    ));

    let config = Config::default().recovery_policy(RecoveryPolicy::TruncateTornTail);
    let log = Log::open_with_config(temp.path(), config).unwrap();
    assert_eq!(log.read(0).unwrap(), b"acknowledged");
    assert_eq!(log.append(b"after crash").unwrap(), 1);
    assert_eq!(fs::metadata(&data_path).unwrap().len(), 20 + 19);
}

#[test]
fn rotated_log_recovers_every_segment() {
    let temp = tempdir().unwrap();
    let config = Config::default().max_segment_bytes(64);
    {
        let log = Log::open_with_config(temp.path(), config.clone()).unwrap();
        for i in 0..20u32 {
            log.append(format!("record-{i}").as_bytes()).unwrap();
        }
    }

    for entry in fs::read_dir(temp.path()).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().is_some_and(|ext| ext == "index") {
            fs::write(&path, b"").unwrap();
        }
    }

    let log = Log::open_with_config(temp.path(), config).unwrap();
    assert!(log.segment_count() > 1);
    for i in 0..20u32 {
        assert_eq!(log.read(u64::from(i)).unwrap(), format!("record-{i}").as_bytes());
    }
}
