//! Benchmark utilities.

use rand::Rng;
use seglog_core::{Config, Log};
use std::path::Path;

/// Generate a random payload of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate `count` random payloads, each between 1 and `max_size` bytes.
pub fn random_payloads(count: usize, max_size: usize) -> Vec<Vec<u8>> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| random_data(rng.gen_range(1..=max_size)))
        .collect()
}

/// Open a log at `root` and fill it with `count` payloads of `size` bytes.
///
/// Appends are not synced one by one; the log is synced once at the end.
pub fn filled_log(root: &Path, count: usize, size: usize) -> Log {
    let log = Log::open_with_config(root, Config::default().sync_on_append(false))
        .expect("open bench log");
    let payload = random_data(size);
    for _ in 0..count {
        log.append(&payload).expect("append bench record");
    }
    log.sync().expect("sync bench log");
    log
}
