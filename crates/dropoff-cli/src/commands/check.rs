//! Check command for listing session rows that fail to parse.
//!
//! Runs the parser only. Rejected rows are reported, never fatal, so this
//! command succeeds even when every row is malformed.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use dropoff_core::{ParsedSessions, RejectedRecord, parse_sessions};

use crate::Config;
use crate::cli::InputArgs;

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Formats the human-readable diagnostics.
pub fn format_check(parsed: &ParsedSessions) -> String {
    let mut output = String::new();

    writeln!(output, "INPUT CHECK").unwrap();
    writeln!(output, "───────────").unwrap();
    writeln!(output, "Records:  {}", parsed.total()).unwrap();
    writeln!(output, "Valid:    {}", parsed.sessions.len()).unwrap();
    writeln!(output, "Rejected: {}", parsed.rejects.len()).unwrap();

    if parsed.total() == 0 {
        writeln!(output).unwrap();
        writeln!(output, "No session records found.").unwrap();
        return output;
    }

    if parsed.rejects.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "All rows parsed.").unwrap();
        return output;
    }

    writeln!(output).unwrap();
    writeln!(output, "REJECTED ROWS").unwrap();
    writeln!(output, "─────────────").unwrap();
    for reject in &parsed.rejects {
        match &reject.user {
            Some(user) => writeln!(output, "row {} ({user}): {}", reject.row, reject.reason),
            None => writeln!(output, "row {}: {}", reject.row, reject.reason),
        }
        .unwrap();
        writeln!(output, "  {:?}", reject.raw).unwrap();
    }

    if parsed.sessions.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No valid sessions; a report cannot be produced.").unwrap();
    }

    output
}

// ========== JSON Output ==========

/// One rejected row in JSON output.
#[derive(Debug, Serialize)]
pub struct JsonReject<'a> {
    pub row: usize,
    pub user: Option<&'a str>,
    pub reason: &'static str,
    pub message: String,
    pub raw: &'a str,
}

#[derive(Debug, Serialize)]
struct JsonCheck<'a> {
    records: usize,
    valid: usize,
    rejected: Vec<JsonReject<'a>>,
}

pub fn json_rejects(rejects: &[RejectedRecord]) -> Vec<JsonReject<'_>> {
    rejects
        .iter()
        .map(|reject| JsonReject {
            row: reject.row,
            user: reject.user.as_deref(),
            reason: reject.reason.as_str(),
            message: reject.reason.to_string(),
            raw: &reject.raw,
        })
        .collect()
}

/// Formats the diagnostics as JSON.
pub fn format_check_json(parsed: &ParsedSessions) -> Result<String> {
    let check = JsonCheck {
        records: parsed.total(),
        valid: parsed.sessions.len(),
        rejected: json_rejects(&parsed.rejects),
    };
    Ok(serde_json::to_string_pretty(&check)?)
}

/// Runs the check command.
pub fn run<W: Write>(writer: &mut W, args: &CheckArgs, config: Config) -> Result<()> {
    let config = config.with_input_args(&args.input);
    let records = super::load_records(&args.input.input, &config)?;
    let parsed = parse_sessions(&records, &config.timestamp_format);

    if args.json {
        writeln!(writer, "{}", format_check_json(&parsed)?)?;
    } else {
        write!(writer, "{}", format_check(&parsed))?;
    }

    Ok(())
}
