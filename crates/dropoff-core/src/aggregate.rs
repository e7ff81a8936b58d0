//! Per-bucket drop-off and presence counts.
//!
//! # Conventions
//!
//! - One row per half-open bucket `[start, end)`; the closing grid point is not
//!   reported as a row of its own.
//! - A drop-off lands in the bucket whose window contains the session end.
//! - Presence is sampled at each bucket's leading edge: a session with a known
//!   start counts when `start <= bucket_start <= end`.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::grid::BucketGrid;
use crate::session::Session;

/// Column headers of the result table, in export order.
pub const TIME_HEADER: &str = "Time";
pub const DROP_OFFS_HEADER: &str = "Drop-offs";
pub const USERS_PRESENT_HEADER: &str = "Users Present";

/// Aggregated counts for one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateRow {
    pub bucket_start: NaiveDateTime,
    /// `HH:MM` label of the bucket start.
    #[serde(rename = "time")]
    pub label: String,
    pub drop_offs: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users_present: Option<usize>,
}

/// Ordered per-bucket rows, one per bucket of the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultTable {
    pub rows: Vec<AggregateRow>,
    pub includes_presence: bool,
}

impl ResultTable {
    /// Headers matching the row layout.
    pub fn headers(&self) -> &'static [&'static str] {
        if self.includes_presence {
            &[TIME_HEADER, DROP_OFFS_HEADER, USERS_PRESENT_HEADER]
        } else {
            &[TIME_HEADER, DROP_OFFS_HEADER]
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_drop_offs(&self) -> usize {
        self.rows.iter().map(|row| row.drop_offs).sum()
    }

    /// Earliest bucket with the highest drop-off count.
    pub fn peak(&self) -> Option<&AggregateRow> {
        self.rows
            .iter()
            .rev()
            .max_by_key(|row| row.drop_offs)
    }

    /// `(label, drop_offs)` pairs in grid order, for plotting.
    pub fn chart_points(&self) -> Vec<(&str, usize)> {
        self.rows
            .iter()
            .map(|row| (row.label.as_str(), row.drop_offs))
            .collect()
    }
}

/// Counts session ends per bucket in one pass.
///
/// Ends outside `[grid.start(), grid.end())` are not counted.
pub fn count_drop_offs(grid: &BucketGrid, sessions: &[Session]) -> Vec<usize> {
    let mut counts = vec![0; grid.len()];
    for session in sessions {
        if let Some(index) = grid.index_of(session.end) {
            counts[index] += 1;
        }
    }
    counts
}

/// Counts sessions present at each bucket's leading edge.
///
/// For sessions with `start <= end`, presence at `t` is
/// `#(start <= t) - #(end < t)`, since every end before `t` also has its start
/// before `t`. Both counts come from sorted arrays.
pub fn count_users_present(grid: &BucketGrid, sessions: &[Session]) -> Vec<usize> {
    let (mut starts, mut ends): (Vec<_>, Vec<_>) = sessions
        .iter()
        .filter_map(|session| {
            session
                .start
                .filter(|start| *start <= session.end)
                .map(|start| (start, session.end))
        })
        .unzip();
    starts.sort_unstable();
    ends.sort_unstable();

    grid.buckets()
        .map(|bucket| {
            let started = starts.partition_point(|start| *start <= bucket.start);
            let ended = ends.partition_point(|end| *end < bucket.start);
            started - ended
        })
        .collect()
}

/// Builds the result table for `sessions` over `grid`.
pub fn aggregate(grid: &BucketGrid, sessions: &[Session], users_present: bool) -> ResultTable {
    let drop_offs = count_drop_offs(grid, sessions);
    let mut present = users_present
        .then(|| count_users_present(grid, sessions))
        .map(Vec::into_iter);

    let rows = grid
        .buckets()
        .zip(drop_offs)
        .map(|(bucket, drop_offs)| AggregateRow {
            bucket_start: bucket.start,
            label: bucket.label(),
            drop_offs,
            users_present: present.as_mut().and_then(Iterator::next),
        })
        .collect();

    ResultTable {
        rows,
        includes_presence: users_present,
    }
}
