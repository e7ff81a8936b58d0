//! End-to-end drop-off computation.
//!
//! [`compute`] is the single entry point: records in, result table or a fatal
//! error out. It performs no I/O.

use std::collections::BTreeSet;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::aggregate::{ResultTable, aggregate};
use crate::error::{AnalysisError, EmptyDataset};
use crate::grid::{BucketGrid, DEFAULT_BUCKET_WIDTH_MINUTES};
use crate::session::{DEFAULT_TIMESTAMP_FORMAT, RawRecord, RejectedRecord, Session, parse_sessions};

/// Configuration for a drop-off computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Width of each bucket in minutes.
    /// Default: 5.
    pub bucket_width_minutes: u32,

    /// `chrono` format string for both timestamps of a session range.
    /// Default: `%d/%m/%Y, %I:%M:%S %p`.
    pub timestamp_format: String,

    /// Whether to compute the users-present column.
    pub users_present: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bucket_width_minutes: DEFAULT_BUCKET_WIDTH_MINUTES,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            users_present: false,
        }
    }
}

impl AnalysisConfig {
    /// Bucket width as a duration, rejecting zero.
    pub fn bucket_width(&self) -> Result<Duration, AnalysisError> {
        if self.bucket_width_minutes == 0 {
            return Err(AnalysisError::InvalidBucketWidth { minutes: 0 });
        }
        Ok(Duration::minutes(i64::from(self.bucket_width_minutes)))
    }
}

/// Result of one computation.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub grid: BucketGrid,
    pub table: ResultTable,
    pub sessions: Vec<Session>,
    pub rejects: Vec<RejectedRecord>,
}

impl Analysis {
    /// Number of input records, valid or not.
    pub fn record_count(&self) -> usize {
        self.sessions.len() + self.rejects.len()
    }

    /// Sessions whose end fell on the closing grid point and so in no bucket.
    pub fn unbucketed_drop_offs(&self) -> usize {
        self.sessions.len() - self.table.total_drop_offs()
    }

    /// Sessions that could not contribute to presence counts.
    pub fn sessions_without_start(&self) -> usize {
        self.sessions.iter().filter(|s| s.start.is_none()).count()
    }

    /// Number of distinct non-empty user identifiers among valid sessions.
    pub fn distinct_users(&self) -> usize {
        self.sessions
            .iter()
            .filter_map(|s| s.user.as_deref())
            .collect::<BTreeSet<_>>()
            .len()
    }
}

/// Parses `records`, builds the grid and aggregates.
///
/// Malformed records are kept in [`Analysis::rejects`]. The computation fails
/// only when the configuration is invalid or no record yields a session.
pub fn compute(records: &[RawRecord], config: &AnalysisConfig) -> Result<Analysis, AnalysisError> {
    let width = config.bucket_width()?;

    if records.is_empty() {
        return Err(AnalysisError::EmptyValidDataset(EmptyDataset::NoRecords));
    }

    let parsed = parse_sessions(records, &config.timestamp_format);
    if parsed.sessions.is_empty() {
        return Err(AnalysisError::EmptyValidDataset(
            EmptyDataset::AllRejected {
                rejected: parsed.rejects.len(),
            },
        ));
    }
    if !parsed.rejects.is_empty() {
        tracing::warn!(
            rejected = parsed.rejects.len(),
            total = parsed.total(),
            "skipped malformed session records"
        );
    }

    let grid = BucketGrid::build(&parsed.sessions, width)?;
    let table = aggregate(&grid, &parsed.sessions, config.users_present);

    Ok(Analysis {
        grid,
        table,
        sessions: parsed.sessions,
        rejects: parsed.rejects,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_records() -> Vec<RawRecord> {
        vec![
            RawRecord::new("01/01/2024, 09:00:00 AM - 01/01/2024, 09:07:00 AM").with_user("ana"),
            RawRecord::new("01/01/2024, 09:00:00 AM - 01/01/2024, 09:12:00 AM").with_user("bo"),
        ]
    }

    #[test]
    fn example_dataset_end_to_end() {
        let analysis = compute(&example_records(), &AnalysisConfig::default()).unwrap();

        let rows: Vec<_> = analysis
            .table
            .rows
            .iter()
            .map(|r| (r.label.as_str(), r.drop_offs))
            .collect();
        assert_eq!(rows, vec![("09:00", 0), ("09:05", 1), ("09:10", 1)]);
        assert_eq!(analysis.record_count(), 2);
        assert_eq!(analysis.unbucketed_drop_offs(), 0);
        assert_eq!(analysis.distinct_users(), 2);
    }

    #[test]
    fn degenerate_session_yields_one_bucket() {
        let records = vec![RawRecord::new(
            "01/01/2024, 10:00:00 AM - 01/01/2024, 10:00:00 AM",
        )];
        let analysis = compute(&records, &AnalysisConfig::default()).unwrap();

        assert_eq!(analysis.table.len(), 1);
        assert_eq!(analysis.table.rows[0].drop_offs, 1);
    }

    #[test]
    fn empty_input_is_no_records() {
        let err = compute(&[], &AnalysisConfig::default()).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::EmptyValidDataset(EmptyDataset::NoRecords)
        );
    }

    #[test]
    fn all_malformed_input_is_all_rejected() {
        let records = vec![
            RawRecord::new("01/01/2024, 09:00:00 AM"),
            RawRecord::new("no range here"),
            RawRecord::new(""),
        ];
        let err = compute(&records, &AnalysisConfig::default()).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::EmptyValidDataset(EmptyDataset::AllRejected { rejected: 3 })
        );
    }

    #[test]
    fn malformed_rows_do_not_change_counts() {
        let mut records = example_records();
        records.insert(1, RawRecord::new("broken"));
        records.push(RawRecord::new("01/01/2024, 09:00:00 AM - not a time"));

        let clean = compute(&example_records(), &AnalysisConfig::default()).unwrap();
        let noisy = compute(&records, &AnalysisConfig::default()).unwrap();

        assert_eq!(noisy.sessions.len(), 2);
        assert_eq!(noisy.rejects.len(), 2);
        assert_eq!(noisy.table, clean.table);
    }

    #[test]
    fn zero_width_is_rejected_before_parsing() {
        let config = AnalysisConfig {
            bucket_width_minutes: 0,
            ..AnalysisConfig::default()
        };
        let err = compute(&[], &config).unwrap_err();
        assert_eq!(err, AnalysisError::InvalidBucketWidth { minutes: 0 });
    }

    #[test]
    fn users_present_column_is_opt_in() {
        let config = AnalysisConfig {
            users_present: true,
            ..AnalysisConfig::default()
        };
        let analysis = compute(&example_records(), &config).unwrap();

        let present: Vec<_> = analysis
            .table
            .rows
            .iter()
            .map(|r| r.users_present)
            .collect();
        assert_eq!(present, vec![Some(2), Some(2), Some(1)]);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let first = compute(&example_records(), &AnalysisConfig::default()).unwrap();
        let second = compute(&example_records(), &AnalysisConfig::default()).unwrap();
        assert_eq!(first.table, second.table);
        assert_eq!(first.grid, second.grid);
    }
}
