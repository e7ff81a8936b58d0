//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::check::CheckArgs;
use crate::commands::export::ExportArgs;
use crate::commands::report::ReportArgs;

/// Session drop-off analysis.
///
/// Reads a CSV of session ranges and counts, per fixed-width time bucket, how
/// many sessions ended and how many were active.
#[derive(Debug, Parser)]
#[command(name = "dropoff", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print drop-off counts per time bucket.
    Report(ReportArgs),

    /// Write drop-off counts per time bucket to a CSV file.
    Export(ExportArgs),

    /// List session rows that cannot be parsed.
    Check(CheckArgs),
}

/// Where to read sessions from and how to interpret them.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// CSV file with a sessions column (`-` for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Column holding `start - end` session ranges.
    #[arg(long, value_name = "NAME")]
    pub sessions_column: Option<String>,

    /// Column holding user identifiers.
    #[arg(long, value_name = "NAME")]
    pub user_column: Option<String>,

    /// Timestamp format in `strftime` syntax (e.g. "%d/%m/%Y, %I:%M:%S %p").
    #[arg(long, value_name = "FORMAT")]
    pub timestamp_format: Option<String>,
}

/// Bucketing options shared by `report` and `export`.
#[derive(Debug, Args)]
pub struct BucketArgs {
    /// Bucket width in minutes.
    #[arg(short, long, value_name = "MINUTES")]
    pub width: Option<u32>,

    /// Also count users present at the start of each bucket.
    #[arg(short, long)]
    pub presence: bool,
}
