//! Implementation of the `dropoff export` command.
//!
//! Writes the result table as CSV with a header row: `Time,Drop-offs` plus
//! `Users Present` when presence is requested.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use dropoff_core::{ResultTable, compute};

use crate::Config;
use crate::cli::{BucketArgs, InputArgs};

/// Default export file name.
pub const DEFAULT_EXPORT_FILE: &str = "drop_off_counts.csv";

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub buckets: BucketArgs,

    /// Output CSV path (`-` for stdout).
    #[arg(short, long, default_value = DEFAULT_EXPORT_FILE, value_name = "PATH")]
    pub output: PathBuf,
}

/// Writes `table` as CSV.
pub fn write_table<W: Write>(writer: W, table: &ResultTable) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv.write_record(table.headers())
        .context("failed to write CSV header")?;
    for row in &table.rows {
        let mut record = vec![row.label.clone(), row.drop_offs.to_string()];
        if let Some(present) = row.users_present {
            record.push(present.to_string());
        }
        csv.write_record(&record)
            .with_context(|| format!("failed to write row {}", row.label))?;
    }

    csv.flush().context("failed to flush CSV output")?;
    Ok(())
}

const fn rows_noun(count: usize) -> &'static str {
    if count == 1 { "row" } else { "rows" }
}

/// Runs the export command.
///
/// Status goes to `writer`; the table goes to the output path, or to `writer`
/// when the path is `-`. Skipped-row warnings always go to `warnings` so they
/// never mix with CSV on stdout.
pub fn run<W: Write, E: Write>(
    writer: &mut W,
    warnings: &mut E,
    args: &ExportArgs,
    config: Config,
) -> Result<()> {
    let config = config
        .with_input_args(&args.input)
        .with_bucket_args(&args.buckets);
    let records = super::load_records(&args.input.input, &config)?;
    let analysis = compute(&records, &config.analysis_config())?;

    let skipped = analysis.rejects.len();
    if skipped > 0 {
        writeln!(
            warnings,
            "Skipped {skipped} malformed {}; run 'dropoff check' for details.",
            rows_noun(skipped)
        )?;
    }

    if args.output == Path::new("-") {
        return write_table(writer, &analysis.table);
    }

    let file = File::create(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    write_table(BufWriter::new(file), &analysis.table)?;

    let rows = analysis.table.len();
    tracing::info!(
        path = %args.output.display(),
        rows,
        "exported drop-off table"
    );
    writeln!(
        writer,
        "Wrote {rows} {} to {}",
        rows_noun(rows),
        args.output.display()
    )?;

    Ok(())
}
