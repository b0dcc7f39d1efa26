//! Free-window detection between occupied intervals.
//!
//! Finds the spans of a planning window that no occupied interval covers.

use super::Interval;

/// Find the free parts of `window` left after removing `occupied`.
///
/// # Arguments
/// * `occupied` - Busy spans, in any order, possibly overlapping each other
/// * `window` - Span to search
///
/// # Returns
/// Coalesced free intervals sorted by start time. Adjacent free intervals are
/// always separated by at least one occupied instant.
pub fn free_windows(occupied: &[Interval], window: Interval) -> Vec<Interval> {
    let mut windows = Vec::new();

    let mut sorted: Vec<Interval> = occupied.to_vec();
    sorted.sort();

    let mut last_end = window.start;

    for busy in &sorted {
        // Already covered by an earlier busy span
        if busy.end <= last_end {
            continue;
        }

        if busy.start >= window.end {
            break;
        }

        if busy.start > last_end {
            if let Some(free) = Interval::new(last_end, busy.start.min(window.end)) {
                windows.push(free);
            }
        }

        last_end = busy.end.min(window.end);
    }

    if let Some(tail) = Interval::new(last_end, window.end) {
        windows.push(tail);
    }

    windows
}

/// Total free minutes across a set of windows
pub fn total_minutes(windows: &[Interval]) -> i64 {
    windows.iter().map(Interval::duration_minutes).sum()
}
