//! Lint rules over a sorted timeline.

use crate::timeline::Timeline;

use super::diagnostic::{Diagnostic, DiagnosticCode};
use super::LintConfig;

/// Flag every event that starts before the furthest end seen so far.
///
/// Touching events (`next.start == active_end`) are not a conflict. The
/// running end only grows, so an event overlapping a long earlier event is
/// still caught after shorter events in between have closed.
pub fn check_overlaps(timeline: &Timeline<'_>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut events = timeline.sorted().iter();

    let Some(first) = events.next() else {
        return diagnostics;
    };
    let mut active_end = first.end_time;

    for next in events {
        if next.start_time < active_end {
            diagnostics.push(Diagnostic::new(
                DiagnosticCode::Overlap,
                "Schedule overlap detected",
                next.start_time,
                next.end_time.min(active_end),
                &next.id,
            ));
        }
        active_end = active_end.max(next.end_time);
    }

    diagnostics
}

/// Warn about gaps between adjacent events that fall inside the configured band.
pub fn check_fragmentation(timeline: &Timeline<'_>, config: &LintConfig) -> Vec<Diagnostic> {
    timeline
        .adjacent_pairs()
        .filter(|(current, next)| next.start_time >= current.end_time)
        .filter_map(|(current, next)| {
            let gap_minutes = (next.start_time - current.end_time).num_minutes();
            config.in_band(gap_minutes).then(|| {
                Diagnostic::new(
                    DiagnosticCode::Fragmentation,
                    format!("Swiss Cheese Gap: {gap_minutes}m"),
                    current.end_time,
                    next.start_time,
                    &current.id,
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Event;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap()
    }

    fn event(id: &str, sh: u32, sm: u32, eh: u32, em: u32) -> Event {
        Event::try_new(id, format!("Event {id}"), at(sh, sm), at(eh, em)).unwrap()
    }

    #[test]
    fn adjacent_overlap_is_detected() {
        let events = vec![event("A", 9, 0, 10, 0), event("B", 9, 30, 10, 30)];
        let timeline = Timeline::new(&events).unwrap();

        let diagnostics = check_overlaps(&timeline);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].event_id.as_deref(), Some("B"));
        assert_eq!(diagnostics[0].start, at(9, 30));
        assert_eq!(diagnostics[0].end, Some(at(10, 0)));
    }

    #[test]
    fn longest_active_interval_detects_late_overlap() {
        let events = vec![
            event("A", 9, 0, 12, 0),
            event("B", 10, 0, 11, 0),
            event("C", 11, 30, 12, 30),
        ];
        let timeline = Timeline::new(&events).unwrap();

        let diagnostics = check_overlaps(&timeline);
        let ids: Vec<_> = diagnostics.iter().map(|d| d.event_id.as_deref().unwrap()).collect();
        assert_eq!(ids, vec!["B", "C"]);
        assert_eq!(diagnostics[1].start, at(11, 30));
        assert_eq!(diagnostics[1].end, Some(at(12, 0)));
    }

    #[test]
    fn overlapping_chain_reports_each_event() {
        let events = vec![
            event("A", 9, 0, 10, 0),
            event("B", 9, 30, 10, 30),
            event("C", 10, 15, 11, 0),
        ];
        let timeline = Timeline::new(&events).unwrap();

        let diagnostics = check_overlaps(&timeline);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[1].start, at(10, 15));
        assert_eq!(diagnostics[1].end, Some(at(10, 30)));
    }

    #[test]
    fn touching_chain_has_no_false_positives() {
        let events = vec![
            event("A", 9, 0, 10, 0),
            event("B", 10, 0, 11, 0),
            event("C", 11, 0, 12, 0),
        ];
        let timeline = Timeline::new(&events).unwrap();
        assert!(check_overlaps(&timeline).is_empty());
        assert!(check_fragmentation(&timeline, &LintConfig::default()).is_empty());
    }

    #[test]
    fn fragmentation_band_is_inclusive() {
        let config = LintConfig::default();
        for (gap, expected) in [(10, 0), (14, 0), (15, 1), (30, 1), (45, 1), (46, 0), (60, 0)] {
            let events = vec![
                event("A", 9, 0, 10, 0),
                Event::try_new(
                    "B",
                    "Event B",
                    at(10, 0) + chrono::Duration::minutes(gap),
                    at(12, 0),
                )
                .unwrap(),
            ];
            let timeline = Timeline::new(&events).unwrap();
            assert_eq!(
                check_fragmentation(&timeline, &config).len(),
                expected,
                "gap of {gap} minutes"
            );
        }
    }

    #[test]
    fn fragmentation_uses_configured_band() {
        let events = vec![event("A", 9, 0, 10, 0), event("B", 11, 0, 12, 0)];
        let timeline = Timeline::new(&events).unwrap();

        assert!(check_fragmentation(&timeline, &LintConfig::default()).is_empty());

        let wide = LintConfig::new(30, 90).unwrap();
        let diagnostics = check_fragmentation(&timeline, &wide);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Swiss Cheese Gap: 60m");
        assert_eq!(diagnostics[0].event_id.as_deref(), Some("A"));
    }
}
