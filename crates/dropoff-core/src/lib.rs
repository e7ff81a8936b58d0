//! Core engine for session drop-off analysis.
//!
//! This crate contains:
//! - Session parsing: turning `"start - end"` strings into intervals, with rejects
//! - Bucket grid: fixed-width windows aligned to midnight spanning the data
//! - Aggregation: per-bucket drop-off and users-present counts

pub mod aggregate;
mod analysis;
pub mod error;
pub mod grid;
pub mod session;

pub use aggregate::{AggregateRow, ResultTable, aggregate};
pub use analysis::{Analysis, AnalysisConfig, compute};
pub use error::{AnalysisError, EmptyDataset, RejectReason};
pub use grid::{Bucket, BucketGrid, DEFAULT_BUCKET_WIDTH_MINUTES};
pub use session::{
    DEFAULT_TIMESTAMP_FORMAT, ParsedSessions, RawRecord, RejectedRecord, Session, parse_session,
    parse_sessions,
};
