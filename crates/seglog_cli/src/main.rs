//! seglog CLI
//!
//! Text frontend and maintenance tools for a seglog storage root.
//!
//! # Commands
//!
//! - `shell` - Interactive `APPEND`/`READ` prompt
//! - `append` - Append one record and print its offset
//! - `read` - Print the record stored at an offset
//! - `inspect` - Display segment layout and sizes
//! - `verify` - Check every index against its data file
//! - `rebuild-index` - Regenerate every index from its data file

mod commands;

use clap::{Parser, Subcommand};
use seglog_core::{Config, Log, RecoveryPolicy};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// seglog command-line tools.
#[derive(Parser)]
#[command(name = "seglog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Storage root holding the segment files
    #[arg(global = true, short, long, default_value = ".")]
    path: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive prompt
    Shell {
        /// Cut a torn final record instead of refusing to start
        #[arg(long)]
        truncate_torn_tail: bool,

        /// Seal the active segment once its data file reaches this size
        #[arg(long)]
        max_segment_bytes: Option<u64>,
    },

    /// Append one record and print its offset
    Append {
        /// Record payload
        payload: String,
    },

    /// Print the record stored at an offset
    Read {
        /// Logical offset of the record
        offset: u64,
    },

    /// Display segment layout and sizes
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check every index against its data file without modifying either
    Verify,

    /// Regenerate every index from its data file
    RebuildIndex {
        /// Cut a torn final record instead of failing
        #[arg(long)]
        truncate_torn_tail: bool,
    },

    /// Show version information
    Version,
}

fn recovery_policy(truncate_torn_tail: bool) -> RecoveryPolicy {
    if truncate_torn_tail {
        RecoveryPolicy::TruncateTornTail
    } else {
        RecoveryPolicy::Strict
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Shell {
            truncate_torn_tail,
            max_segment_bytes,
        } => {
            let mut config = Config::default().recovery_policy(recovery_policy(truncate_torn_tail));
            config.max_segment_bytes = max_segment_bytes;
            let log = Log::open_with_config(&cli.path, config)?;
            let stdin = std::io::stdin();
            commands::shell::run(&log, stdin.lock(), std::io::stdout())?;
            log.close()?;
        }
        Commands::Append { payload } => {
            let log = Log::open(&cli.path)?;
            println!("{}", log.append(payload.as_bytes())?);
            log.close()?;
        }
        Commands::Read { offset } => {
            let log = Log::open(&cli.path)?;
            println!("{}", String::from_utf8_lossy(&log.read(offset)?));
            log.close()?;
        }
        Commands::Inspect { format } => {
            commands::inspect::run(&cli.path, &format)?;
        }
        Commands::Verify => {
            commands::verify::run(&cli.path)?;
        }
        Commands::RebuildIndex { truncate_torn_tail } => {
            commands::rebuild_index::run(&cli.path, recovery_policy(truncate_torn_tail))?;
        }
        Commands::Version => {
            println!("seglog CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("seglog core v{}", seglog_core::VERSION);
        }
    }

    Ok(())
}
