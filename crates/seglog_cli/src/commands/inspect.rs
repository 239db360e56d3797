//! Inspect command implementation.

use seglog_core::index::RecordScanner;
use seglog_core::LogDir;
use seglog_storage::{FileBackend, StorageBackend};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Log inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Storage root.
    pub path: String,
    /// Offset the next append would receive.
    pub next_offset: u64,
    /// Total size of all data files in bytes.
    pub data_size: u64,
    /// Total size of all index files in bytes.
    pub index_size: u64,
    /// Per-segment details, lowest base offset first.
    pub segments: Vec<SegmentStats>,
}

/// Statistics for a single segment.
#[derive(Debug, Serialize)]
pub struct SegmentStats {
    /// First offset of the segment.
    pub base_offset: u64,
    /// Offset the next append to this segment would receive.
    pub next_offset: u64,
    /// Number of complete records in the data file.
    pub records: u64,
    /// Data file size in bytes.
    pub data_bytes: u64,
    /// Index file size in bytes, 0 if the index is missing.
    pub index_bytes: u64,
    /// Why the scan stopped early, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
}

/// Collects the layout of the log at `path` without modifying any segment
/// file.
///
/// Records are counted by scanning each data file; index files are only
/// measured. A torn data file is reported on its segment rather than
/// failing the whole inspection.
pub fn inspect(path: &Path) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let dir = LogDir::open(path, false)?;
    let mut segments = Vec::new();

    for base_offset in dir.discover_base_offsets()? {
        let data = FileBackend::open(&dir.data_path(base_offset))?;

        let mut records = 0u64;
        let mut problem = None;
        for span in RecordScanner::new(&data)? {
            match span {
                Ok(_) => records += 1,
                Err(err) => problem = Some(err.to_string()),
            }
        }

        let index_path = dir.index_path(base_offset);
        let index_bytes = if index_path.is_file() {
            fs::metadata(&index_path)?.len()
        } else {
            0
        };

        segments.push(SegmentStats {
            base_offset,
            next_offset: base_offset + records,
            records,
            data_bytes: data.size()?,
            index_bytes,
            problem,
        });
    }

    Ok(InspectResult {
        path: path.display().to_string(),
        next_offset: segments.last().map_or(0, |s| s.next_offset),
        data_size: segments.iter().map(|s| s.data_bytes).sum(),
        index_size: segments.iter().map(|s| s.index_bytes).sum(),
        segments,
    })
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("seglog Inspection");
    println!("=================");
    println!();
    println!("Path: {}", result.path);
    println!("Next offset: {}", result.next_offset);
    println!();
    println!("Storage:");
    println!("  Data size:   {}", format_size(result.data_size));
    println!("  Index size:  {}", format_size(result.index_size));
    println!();
    println!("Segments:");
    for segment in &result.segments {
        println!(
            "  [{}..{}) {} records, {} data, {} index",
            segment.base_offset,
            segment.next_offset,
            segment.records,
            format_size(segment.data_bytes),
            format_size(segment.index_bytes)
        );
        if let Some(problem) = &segment.problem {
            println!("    WARNING: {}", problem);
        }
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
