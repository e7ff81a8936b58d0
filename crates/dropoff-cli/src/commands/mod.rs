//! CLI subcommand implementations.

pub mod check;
pub mod export;
pub mod report;

use std::path::Path;

use anyhow::Result;

use dropoff_core::RawRecord;

use crate::Config;
use crate::input::{open_input, read_records};

/// Reads the input table using the configured column names.
fn load_records(path: &Path, config: &Config) -> Result<Vec<RawRecord>> {
    let reader = open_input(path)?;
    read_records(reader, &config.sessions_column, &config.user_column)
}
