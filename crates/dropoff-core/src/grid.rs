//! Fixed-width bucket grid spanning the observed sessions.
//!
//! Grid points are multiples of the bucket width measured from midnight of the
//! earliest observed timestamp. The first point is that timestamp floored to
//! the grid, the last is the latest session end ceiled to the grid.

use chrono::{Duration, NaiveDateTime, NaiveTime};

use crate::error::{AnalysisError, EmptyDataset};
use crate::session::Session;

/// Default bucket width in minutes.
pub const DEFAULT_BUCKET_WIDTH_MINUTES: u32 = 5;

/// A half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Bucket {
    /// Wall-clock label of the bucket start, `HH:MM`.
    pub fn label(&self) -> String {
        self.start.format("%H:%M").to_string()
    }
}

/// Ordered, contiguous sequence of equal-width buckets.
///
/// Always holds at least one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketGrid {
    start: NaiveDateTime,
    width: Duration,
    len: usize,
}

impl BucketGrid {
    /// Builds the grid covering every timestamp in `sessions`.
    ///
    /// The span runs from the earliest start or end to the latest end.
    pub fn build(sessions: &[Session], width: Duration) -> Result<Self, AnalysisError> {
        if width <= Duration::zero() {
            return Err(AnalysisError::InvalidBucketWidth {
                minutes: width.num_minutes(),
            });
        }

        let low = sessions.iter().map(Session::earliest).min();
        let high = sessions.iter().map(|session| session.end).max();
        let (Some(low), Some(high)) = (low, high) else {
            return Err(AnalysisError::EmptyValidDataset(EmptyDataset::NoSessions));
        };

        let grid = Self::spanning(low, high, width);
        tracing::debug!(
            start = %grid.start,
            end = %grid.end(),
            buckets = grid.len,
            "built bucket grid"
        );
        Ok(grid)
    }

    /// Grid from `low` floored to `high` ceiled. `width` must be positive.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn spanning(low: NaiveDateTime, high: NaiveDateTime, width: Duration) -> Self {
        let origin = low.date().and_time(NaiveTime::MIN);
        let step = width.num_milliseconds();

        let first = (low - origin).num_milliseconds().div_euclid(step);
        let high_offset = (high - origin).num_milliseconds();
        let last = high_offset.div_euclid(step) + i64::from(high_offset.rem_euclid(step) != 0);

        Self {
            start: origin + Duration::milliseconds(first * step),
            width,
            // Coinciding endpoints still get one bucket.
            len: (last - first).max(1) as usize,
        }
    }

    /// First grid point; start of the first bucket.
    pub const fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Closing grid point; end of the last bucket.
    pub fn end(&self) -> NaiveDateTime {
        self.boundary(self.len)
    }

    pub const fn width(&self) -> Duration {
        self.width
    }

    /// Number of buckets (one fewer than the number of grid points).
    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[allow(clippy::cast_possible_wrap)]
    fn boundary(&self, index: usize) -> NaiveDateTime {
        self.start + Duration::milliseconds(self.width.num_milliseconds() * index as i64)
    }

    /// Buckets in increasing time order.
    pub fn buckets(&self) -> impl Iterator<Item = Bucket> {
        let grid = *self;
        (0..grid.len).map(move |index| Bucket {
            start: grid.boundary(index),
            end: grid.boundary(index + 1),
        })
    }

    /// Index of the bucket whose half-open window contains `instant`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn index_of(&self, instant: NaiveDateTime) -> Option<usize> {
        if instant < self.start {
            return None;
        }
        let offset = (instant - self.start).num_milliseconds() / self.width.num_milliseconds();
        let index = offset as usize;
        (index < self.len).then_some(index)
    }
}
