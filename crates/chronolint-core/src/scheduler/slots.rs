//! Per-day free slots with a daily capacity ledger.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, Duration, NaiveDate, Utc};

use super::{FocusHours, ReasonCode};
use crate::timeline::Interval;

/// Why [`SlotBook::place`] found no room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shortfall {
    /// No slot is long enough
    NoWindow,
    /// Every long-enough slot ends the block after the deadline
    PastDeadline(DateTime<Utc>),
    /// Only the daily cap is in the way
    OverCapacity(u32),
}

impl Shortfall {
    pub(crate) fn reason_code(&self) -> ReasonCode {
        match self {
            Self::NoWindow => ReasonCode::NoFeasibleWindow,
            Self::PastDeadline(_) => ReasonCode::DeadlineExceeded,
            Self::OverCapacity(_) => ReasonCode::CapacityExceeded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    day: NaiveDate,
    span: Interval,
}

/// Free time cut into single-day slots, consumed as blocks are placed.
#[derive(Debug, Clone)]
pub(crate) struct SlotBook {
    slots: Vec<Slot>,
    used: BTreeMap<NaiveDate, u32>,
    capacity_per_day: Option<u32>,
}

impl SlotBook {
    /// Cut `free` windows at UTC midnights and, if set, to the daily focus band.
    pub(crate) fn new(
        free: &[Interval],
        focus_hours: Option<FocusHours>,
        capacity_per_day: Option<u32>,
    ) -> Self {
        let mut slots = Vec::new();

        for window in free {
            for (day, piece) in window.split_by_day() {
                let span = match focus_hours {
                    Some(focus) => {
                        match focus_band(day, focus).and_then(|band| band.intersect(&piece)) {
                            Some(span) => span,
                            None => continue,
                        }
                    }
                    None => piece,
                };
                slots.push(Slot { day, span });
            }
        }

        Self {
            slots,
            used: BTreeMap::new(),
            capacity_per_day,
        }
    }

    /// Total free minutes still available
    pub(crate) fn free_minutes(&self) -> i64 {
        self.slots.iter().map(|s| s.span.duration_minutes()).sum()
    }

    /// Minutes already planned on `day`
    pub(crate) fn used_on(&self, day: NaiveDate) -> u32 {
        self.used.get(&day).copied().unwrap_or(0)
    }

    /// The daily cap, when `minutes` more on `day` would exceed it.
    fn exceeded_cap(&self, day: NaiveDate, minutes: u32) -> Option<u32> {
        self.capacity_per_day
            .filter(|cap| self.used_on(day).saturating_add(minutes) > *cap)
    }

    /// Reserve `minutes` in the earliest slot that allows it.
    ///
    /// The block starts at the slot start, or at `earliest` when that falls
    /// inside the slot. A slot is skipped when the block would not fit, would
    /// end after `deadline`, or would push its day over capacity.
    ///
    /// # Errors
    /// - `NoWindow` when no slot is long enough
    /// - `PastDeadline` when every long-enough slot misses the deadline
    /// - `OverCapacity` when some slot meets the deadline but its day is full
    pub(crate) fn place(
        &mut self,
        minutes: u32,
        earliest: Option<DateTime<Utc>>,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<Interval, Shortfall> {
        let length = Duration::minutes(i64::from(minutes));
        let mut shortfall = Shortfall::NoWindow;

        for index in 0..self.slots.len() {
            let slot = self.slots[index];
            let start = earliest.map_or(slot.span.start, |e| e.max(slot.span.start));
            let end = start + length;
            let Some(block) = Interval::new(start, end) else {
                continue;
            };
            if !slot.span.encloses(&block) {
                continue;
            }

            if let Some(deadline) = deadline.filter(|d| block.end > *d) {
                if shortfall == Shortfall::NoWindow {
                    shortfall = Shortfall::PastDeadline(deadline);
                }
                continue;
            }

            if let Some(cap) = self.exceeded_cap(slot.day, minutes) {
                shortfall = Shortfall::OverCapacity(cap);
                continue;
            }

            self.consume(index, block);
            *self.used.entry(slot.day).or_default() += minutes;
            return Ok(block);
        }

        Err(shortfall)
    }

    /// Remove `block` from slot `index`, keeping whatever is left on either side.
    fn consume(&mut self, index: usize, block: Interval) {
        let slot = self.slots[index];
        let remainder: Vec<Slot> = [
            Interval::new(slot.span.start, block.start),
            Interval::new(block.end, slot.span.end),
        ]
        .into_iter()
        .flatten()
        .map(|span| Slot { day: slot.day, span })
        .collect();

        self.slots.splice(index..=index, remainder);
    }
}

/// `[start_hour, end_hour)` on `day`; hour 24 means the following midnight.
fn focus_band(day: NaiveDate, focus: FocusHours) -> Option<Interval> {
    let at_hour = |hour: u32| -> Option<DateTime<Utc>> {
        let naive = if hour == 24 {
            day.checked_add_days(Days::new(1))?.and_hms_opt(0, 0, 0)
        } else {
            day.and_hms_opt(hour, 0, 0)
        };
        naive.map(|naive| naive.and_utc())
    };
    Interval::new(at_hour(focus.start_hour)?, at_hour(focus.end_hour)?)
}
