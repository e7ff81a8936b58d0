//! Report command for printing drop-off counts.
//!
//! This module implements `dropoff report` with human-readable and JSON output.

use std::fmt::{Display, Write as _};
use std::io::Write;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use dropoff_core::{AggregateRow, Analysis, BucketGrid, compute};

use super::check::{JsonReject, json_rejects};
use crate::Config;
use crate::cli::{BucketArgs, InputArgs};

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub buckets: BucketArgs,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

// ========== Formatting Helpers ==========

/// Describes the grid span, e.g. "2024-01-01 09:00 to 09:15 (5-minute buckets)".
fn format_span(grid: &BucketGrid) -> String {
    let start = grid.start();
    let end = grid.end();
    let end_fmt = if end.date() == start.date() {
        "%H:%M"
    } else {
        "%Y-%m-%d %H:%M"
    };
    format!(
        "{} to {} ({}-minute buckets)",
        start.format("%Y-%m-%d %H:%M"),
        end.format(end_fmt),
        grid.width().num_minutes()
    )
}

/// Generates a 10-character bar.
/// Values <5% of max get a single block for visibility.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn progress_bar(value: usize, max: usize) -> String {
    if max == 0 {
        return "░░░░░░░░░░".to_string();
    }

    let ratio = value as f64 / max as f64;
    let filled = if ratio < 0.05 && value > 0 {
        1
    } else {
        (ratio * 10.0).round().min(10.0) as usize
    };

    let empty = 10 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

fn summary_line(output: &mut String, name: &str, value: impl Display) {
    writeln!(output, "{:<15} {value}", format!("{name}:")).unwrap();
}

// ========== Report Generation ==========

/// Formats the human-readable report output.
pub fn format_report(analysis: &Analysis) -> String {
    let mut output = String::new();
    let table = &analysis.table;

    writeln!(output, "DROP-OFF REPORT: {}", format_span(&analysis.grid)).unwrap();
    writeln!(output).unwrap();

    if table.includes_presence {
        writeln!(output, "TIME   DROP-OFFS  PRESENT").unwrap();
        writeln!(output, "─────  ─────────  ───────").unwrap();
    } else {
        writeln!(output, "TIME   DROP-OFFS").unwrap();
        writeln!(output, "─────  ─────────").unwrap();
    }

    let max = table.peak().map_or(0, |row| row.drop_offs);
    for row in &table.rows {
        let bar = progress_bar(row.drop_offs, max);
        match row.users_present {
            Some(present) => writeln!(
                output,
                "{:<5}  {:>9}  {present:>7}  {bar}",
                row.label, row.drop_offs
            ),
            None => writeln!(output, "{:<5}  {:>9}  {bar}", row.label, row.drop_offs),
        }
        .unwrap();
    }

    // SUMMARY section
    writeln!(output).unwrap();
    writeln!(output, "SUMMARY").unwrap();
    writeln!(output, "───────").unwrap();
    summary_line(&mut output, "Sessions", analysis.sessions.len());

    let users = analysis.distinct_users();
    if users > 0 {
        summary_line(&mut output, "Users", users);
    }

    summary_line(&mut output, "Drop-offs", table.total_drop_offs());
    match table.peak().filter(|row| row.drop_offs > 0) {
        Some(row) => summary_line(
            &mut output,
            "Peak bucket",
            format!("{} ({})", row.label, row.drop_offs),
        ),
        None => summary_line(&mut output, "Peak bucket", "none"),
    }

    let unbucketed = analysis.unbucketed_drop_offs();
    if unbucketed > 0 {
        summary_line(
            &mut output,
            "Unbucketed",
            format!(
                "{unbucketed} (ended at {})",
                analysis.grid.end().format("%H:%M")
            ),
        );
    }

    let without_start = analysis.sessions_without_start();
    if table.includes_presence && without_start > 0 {
        summary_line(
            &mut output,
            "No start time",
            format!("{without_start} (not counted as present)"),
        );
    }

    let skipped = analysis.rejects.len();
    if skipped > 0 {
        let noun = if skipped == 1 { "row" } else { "rows" };
        writeln!(output).unwrap();
        writeln!(output, "Skipped {skipped} malformed {noun}.").unwrap();
        writeln!(output, "Hint: Run 'dropoff check' to list them.").unwrap();
    }

    output
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub grid: JsonGrid,
    pub rows: &'a [AggregateRow],
    pub chart: Vec<JsonChartPoint<'a>>,
    pub summary: JsonSummary,
    pub rejects: Vec<JsonReject<'a>>,
}

#[derive(Debug, Serialize)]
pub struct JsonGrid {
    pub start: String,
    pub end: String,
    pub bucket_width_minutes: i64,
    pub buckets: usize,
}

#[derive(Debug, Serialize)]
pub struct JsonChartPoint<'a> {
    pub time: &'a str,
    pub drop_offs: usize,
}

#[derive(Debug, Serialize)]
pub struct JsonSummary {
    pub records: usize,
    pub sessions: usize,
    pub rejected: usize,
    pub distinct_users: usize,
    pub drop_offs: usize,
    pub unbucketed_drop_offs: usize,
}

/// Formats the analysis as JSON.
pub fn format_report_json(analysis: &Analysis) -> Result<String> {
    let grid = &analysis.grid;
    let report = JsonReport {
        grid: JsonGrid {
            start: grid.start().format("%Y-%m-%dT%H:%M:%S").to_string(),
            end: grid.end().format("%Y-%m-%dT%H:%M:%S").to_string(),
            bucket_width_minutes: grid.width().num_minutes(),
            buckets: grid.len(),
        },
        rows: &analysis.table.rows,
        chart: analysis
            .table
            .chart_points()
            .into_iter()
            .map(|(time, drop_offs)| JsonChartPoint { time, drop_offs })
            .collect(),
        summary: JsonSummary {
            records: analysis.record_count(),
            sessions: analysis.sessions.len(),
            rejected: analysis.rejects.len(),
            distinct_users: analysis.distinct_users(),
            drop_offs: analysis.table.total_drop_offs(),
            unbucketed_drop_offs: analysis.unbucketed_drop_offs(),
        },
        rejects: json_rejects(&analysis.rejects),
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Public Interface ==========

/// Runs the report command.
pub fn run<W: Write>(writer: &mut W, args: &ReportArgs, config: Config) -> Result<()> {
    let config = config
        .with_input_args(&args.input)
        .with_bucket_args(&args.buckets);
    let records = super::load_records(&args.input.input, &config)?;
    let analysis = compute(&records, &config.analysis_config())?;

    if args.json {
        writeln!(writer, "{}", format_report_json(&analysis)?)?;
    } else {
        write!(writer, "{}", format_report(&analysis))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use dropoff_core::{AnalysisConfig, RawRecord};
    use insta::assert_snapshot;

    fn example_records() -> Vec<RawRecord> {
        vec![
            RawRecord::new("01/01/2024, 09:00:00 AM - 01/01/2024, 09:07:00 AM").with_user("ana"),
            RawRecord::new("01/01/2024, 09:00:00 AM - 01/01/2024, 09:12:00 AM").with_user("bo"),
        ]
    }

    fn with_presence() -> AnalysisConfig {
        AnalysisConfig {
            users_present: true,
            ..AnalysisConfig::default()
        }
    }

    // ========== Progress Bar Tests ==========

    #[test]
    fn test_progress_bar_full() {
        assert_eq!(progress_bar(7, 7), "██████████");
    }

    #[test]
    fn test_progress_bar_partial() {
        assert_eq!(progress_bar(5, 10), "█████░░░░░");
        assert_eq!(progress_bar(2, 10), "██░░░░░░░░");
    }

    #[test]
    fn test_progress_bar_minimum() {
        assert_eq!(progress_bar(1, 100), "█░░░░░░░░░");
    }

    #[test]
    fn test_progress_bar_zero() {
        assert_eq!(progress_bar(0, 0), "░░░░░░░░░░");
        assert_eq!(progress_bar(0, 3), "░░░░░░░░░░");
    }

    // ========== Report Tests (Snapshot) ==========

    #[test]
    fn test_report_example_dataset() {
        let analysis = compute(&example_records(), &AnalysisConfig::default()).unwrap();
        assert_snapshot!(format_report(&analysis), @r"
        DROP-OFF REPORT: 2024-01-01 09:00 to 09:15 (5-minute buckets)

        TIME   DROP-OFFS
        ─────  ─────────
        09:00          0  ░░░░░░░░░░
        09:05          1  ██████████
        09:10          1  ██████████

        SUMMARY
        ───────
        Sessions:       2
        Users:          2
        Drop-offs:      2
        Peak bucket:    09:05 (1)
        ");
    }

    #[test]
    fn test_report_with_presence_and_rejects() {
        let mut records = example_records();
        records.insert(1, RawRecord::new("broken"));
        records.push(RawRecord::new("sometime - 01/01/2024, 09:03:00 AM").with_user("cy"));

        let analysis = compute(&records, &with_presence()).unwrap();
        assert_snapshot!(format_report(&analysis), @r"
        DROP-OFF REPORT: 2024-01-01 09:00 to 09:15 (5-minute buckets)

        TIME   DROP-OFFS  PRESENT
        ─────  ─────────  ───────
        09:00          1        2  ██████████
        09:05          1        2  ██████████
        09:10          1        1  ██████████

        SUMMARY
        ───────
        Sessions:       3
        Users:          3
        Drop-offs:      3
        Peak bucket:    09:00 (1)
        No start time:  1 (not counted as present)

        Skipped 1 malformed row.
        Hint: Run 'dropoff check' to list them.
        ");
    }

    #[test]
    fn test_report_notes_unbucketed_drop_offs() {
        let records = vec![
            RawRecord::new("01/01/2024, 09:00:00 AM - 01/01/2024, 09:03:00 AM"),
            RawRecord::new("01/01/2024, 09:00:00 AM - 01/01/2024, 09:10:00 AM"),
        ];
        let analysis = compute(&records, &AnalysisConfig::default()).unwrap();
        let output = format_report(&analysis);

        assert!(output.contains("Unbucketed:     1 (ended at 09:10)"));
        assert!(!output.contains("Users:"));
    }

    #[test]
    fn test_report_span_across_midnight_shows_end_date() {
        let records = vec![RawRecord::new(
            "01/01/2024, 11:58:00 PM - 02/01/2024, 12:07:00 AM",
        )];
        let analysis = compute(&records, &AnalysisConfig::default()).unwrap();
        let output = format_report(&analysis);

        assert!(output.starts_with(
            "DROP-OFF REPORT: 2024-01-01 23:55 to 2024-01-02 00:10 (5-minute buckets)"
        ));
    }

    #[test]
    fn test_report_json_output() {
        let mut records = example_records();
        records.push(RawRecord::new("garbage").with_user("zed"));
        let analysis = compute(&records, &AnalysisConfig::default()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&format_report_json(&analysis).unwrap()).unwrap();

        assert_eq!(json["grid"]["start"], "2024-01-01T09:00:00");
        assert_eq!(json["grid"]["end"], "2024-01-01T09:15:00");
        assert_eq!(json["grid"]["buckets"], 3);
        assert_eq!(json["rows"][1]["time"], "09:05");
        assert_eq!(json["rows"][1]["drop_offs"], 1);
        assert!(json["rows"][1].get("users_present").is_none());
        assert_eq!(json["chart"][2]["time"], "09:10");
        assert_eq!(json["summary"]["records"], 3);
        assert_eq!(json["summary"]["rejected"], 1);
        assert_eq!(json["rejects"][0]["row"], 3);
        assert_eq!(json["rejects"][0]["user"], "zed");
        assert_eq!(json["rejects"][0]["reason"], "malformed_session_field");
    }

    #[test]
    fn test_run_reports_empty_dataset() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("sessions.csv");
        std::fs::write(&path, "Sessions\nnope\nstill nope\n").unwrap();

        let args = ReportArgs {
            input: InputArgs {
                input: path,
                sessions_column: None,
                user_column: None,
                timestamp_format: None,
            },
            buckets: BucketArgs {
                width: None,
                presence: false,
            },
            json: false,
        };
        let mut output = Vec::new();
        let err = run(&mut output, &args, Config::default()).unwrap_err();

        assert_eq!(
            err.to_string(),
            "no valid data: all 2 session records were malformed"
        );
        assert!(output.is_empty());
    }
}
