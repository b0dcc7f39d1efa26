//! Half-open time intervals.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A non-empty `[start, end)` span of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    /// Create a new interval. Returns `None` unless `end > start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }

    /// Get duration in whole minutes (truncated)
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Check if this interval overlaps another. Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Check if an instant falls inside `[start, end)`
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Check if `other` lies entirely within this interval
    pub fn encloses(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// The overlapping part of two intervals, if any
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        Self::new(self.start.max(other.start), self.end.min(other.end))
    }

    /// Split at UTC midnights, tagging each piece with its calendar day.
    pub fn split_by_day(&self) -> Vec<(NaiveDate, Interval)> {
        let mut pieces = Vec::new();
        let mut cursor = self.start;

        while cursor < self.end {
            let day = cursor.date_naive();
            let next_midnight = day
                .checked_add_days(Days::new(1))
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
                .unwrap_or(self.end);
            let piece_end = next_midnight.min(self.end);
            pieces.push((day, Interval { start: cursor, end: piece_end }));
            cursor = piece_end;
        }

        pieces
    }
}
