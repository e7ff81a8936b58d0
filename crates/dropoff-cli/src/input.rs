//! CSV ingestion into raw session records.
//!
//! The only required column is the sessions column. Session cells may contain
//! quoted newlines (metadata after the end timestamp); those are kept intact
//! for the parser to strip.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result, bail};

use dropoff_core::RawRecord;

/// Opens `path` for reading, treating `-` as stdin.
pub fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    if path == Path::new("-") {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file =
        File::open(path).with_context(|| format!("failed to open input {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Reads every data row into a [`RawRecord`].
///
/// Fails if the header row lacks `sessions_column`. A missing `user_column`
/// only means records carry no user.
pub fn read_records<R: Read>(
    reader: R,
    sessions_column: &str,
    user_column: &str,
) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader
        .headers()
        .context("failed to read CSV header row")?
        .clone();

    let find = |name: &str| {
        headers
            .iter()
            .position(|header| header.trim_start_matches('\u{feff}').trim() == name)
    };

    let Some(sessions_idx) = find(sessions_column) else {
        let found: Vec<_> = headers.iter().collect();
        bail!(
            "input has no {sessions_column:?} column (found: {})",
            found.join(", ")
        );
    };
    let user_idx = find(user_column);
    if user_idx.is_none() {
        tracing::debug!(column = user_column, "no user column in input");
    }

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("failed to read CSV record {}", idx + 1))?;
        let description = row.get(sessions_idx).unwrap_or_default().to_string();
        let user = user_idx
            .and_then(|i| row.get(i))
            .map(str::trim)
            .filter(|user| !user.is_empty())
            .map(str::to_string);
        records.push(RawRecord { description, user });
    }

    tracing::debug!(records = records.len(), "read session records");
    Ok(records)
}
