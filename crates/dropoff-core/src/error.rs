//! Error types for session parsing and drop-off analysis.

use thiserror::Error;

/// Why a single session record was left out of the analysis.
///
/// Rejections are per-record and never abort a batch; they are collected
/// alongside the parsed sessions for diagnostic reporting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The description has no `" - "` separator between start and end.
    #[error("missing ' - ' separator between start and end")]
    MalformedSessionField,

    /// The end token did not match the configured timestamp format.
    #[error("cannot parse end timestamp {token:?} ({cause})")]
    UnparseableTimestamp {
        token: String,
        cause: chrono::ParseError,
    },
}

impl RejectReason {
    /// Stable machine-readable name for the reason.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedSessionField => "malformed_session_field",
            Self::UnparseableTimestamp { .. } => "unparseable_timestamp",
        }
    }
}

/// Why there is nothing to aggregate.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EmptyDataset {
    /// The input contained no session records at all.
    #[error("no session records found in input")]
    NoRecords,

    /// Every record was rejected during parsing.
    #[error("all {rejected} session records were malformed")]
    AllRejected { rejected: usize },

    /// The grid builder was handed an empty session list.
    #[error("no valid sessions to bucket")]
    NoSessions,
}

/// Fatal errors for a drop-off computation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// There are no valid sessions, so no result table can be produced.
    #[error("no valid data: {0}")]
    EmptyValidDataset(EmptyDataset),

    /// Bucket width must be a positive number of minutes.
    #[error("bucket width must be at least one minute, got {minutes}")]
    InvalidBucketWidth { minutes: i64 },
}
