//! Ordered view over events.
//!
//! This module provides:
//! - Half-open interval utilities
//! - A stable start-time ordering of events, shared by the linter and planner
//! - Fixed-event occupancy and free-window computation

mod gap;
mod interval;

pub use gap::{free_windows, total_minutes};
pub use interval::Interval;

use crate::error::ValidationError;
use crate::schedule::Event;

/// Events sorted by `(start_time, id)`.
///
/// Borrows the caller's events and never mutates them.
#[derive(Debug, Clone)]
pub struct Timeline<'a> {
    events: Vec<&'a Event>,
}

impl<'a> Timeline<'a> {
    /// Build a timeline over `events`.
    ///
    /// # Errors
    /// Returns `MalformedInterval` for the first event (in input order) whose
    /// end is not strictly after its start.
    pub fn new(events: &'a [Event]) -> Result<Self, ValidationError> {
        for event in events {
            event.interval()?;
        }

        let mut sorted: Vec<&Event> = events.iter().collect();
        sorted.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(Self { events: sorted })
    }

    /// Events in ascending start order, ties broken by id
    pub fn sorted(&self) -> &[&'a Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Adjacent `(current, next)` pairs in sorted order
    pub fn adjacent_pairs(&self) -> impl Iterator<Item = (&'a Event, &'a Event)> + '_ {
        self.events.windows(2).map(|pair| (pair[0], pair[1]))
    }

    /// `[start, end)` spans of fixed events only, sorted
    pub fn occupied_intervals(&self) -> Vec<Interval> {
        let mut intervals: Vec<Interval> = self
            .events
            .iter()
            .filter(|event| event.is_fixed)
            .filter_map(|event| Interval::new(event.start_time, event.end_time))
            .collect();
        intervals.sort();
        intervals
    }

    /// Free parts of `window` once fixed events are removed
    pub fn free_windows(&self, window: Interval) -> Vec<Interval> {
        free_windows(&self.occupied_intervals(), window)
    }
}
