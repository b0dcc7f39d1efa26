//! Time-bound events on the calendar.
//!
//! Events are the input to both the linter and the planner. Fixed events
//! block planning capacity and are never relocated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::timeline::Interval;

/// A time-bound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub is_fixed: bool,
}

impl Event {
    /// Create a new event, returning a Result
    ///
    /// Content is trimmed before it is stored.
    ///
    /// # Errors
    /// Returns an error if `content` is blank or `end_time <= start_time`
    pub fn try_new(
        id: impl Into<String>,
        content: impl AsRef<str>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let id = id.into();
        let content = content.as_ref().trim();
        if content.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "content".to_string(),
                message: "content must not be empty".to_string(),
            });
        }
        if end_time <= start_time {
            return Err(ValidationError::MalformedInterval {
                event_id: id,
                start: start_time,
                end: end_time,
            });
        }
        Ok(Self {
            id,
            content: content.to_string(),
            tags: Vec::new(),
            start_time,
            end_time,
            is_fixed: false,
        })
    }

    /// Mark the event as fixed
    pub fn fixed(mut self) -> Self {
        self.is_fixed = true;
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Get duration in minutes
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    /// The `[start_time, end_time)` span of this event.
    ///
    /// # Errors
    /// Returns `MalformedInterval` if the event was deserialized with
    /// `end_time <= start_time`.
    pub fn interval(&self) -> Result<Interval, ValidationError> {
        Interval::new(self.start_time, self.end_time).ok_or_else(|| {
            ValidationError::MalformedInterval {
                event_id: self.id.clone(),
                start: self.start_time,
                end: self.end_time,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn try_new_trims_content() {
        let event = Event::try_new("e1", "  Standup  ", at(9, 0), at(9, 15)).unwrap();
        assert_eq!(event.content, "Standup");
        assert!(!event.is_fixed);
        assert_eq!(event.duration_minutes(), 15);
    }

    #[test]
    fn try_new_rejects_blank_content() {
        let err = Event::try_new("e1", "   ", at(9, 0), at(10, 0)).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { .. }));
    }

    #[test]
    fn try_new_rejects_empty_interval() {
        let err = Event::try_new("e1", "Lunch", at(12, 0), at(12, 0)).unwrap_err();
        assert!(matches!(err, ValidationError::MalformedInterval { .. }));
    }

    #[test]
    fn interval_reports_event_id_for_deserialized_garbage() {
        let event = Event {
            id: "bad".to_string(),
            content: "Backwards".to_string(),
            tags: Vec::new(),
            start_time: at(10, 0),
            end_time: at(10, 0) - Duration::minutes(5),
            is_fixed: true,
        };
        match event.interval() {
            Err(ValidationError::MalformedInterval { event_id, .. }) => assert_eq!(event_id, "bad"),
            other => panic!("expected MalformedInterval, got {other:?}"),
        }
    }

    #[test]
    fn event_deserialization_defaults() {
        let json = r#"{
            "id": "event-1",
            "start_time": "2024-01-10T09:00:00Z",
            "end_time": "2024-01-10T10:00:00Z"
        }"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.id, "event-1");
        assert!(event.tags.is_empty());
        assert!(!event.is_fixed);
    }

    #[test]
    fn builder_helpers() {
        let event = Event::try_new("e1", "Gym", at(7, 0), at(8, 0))
            .unwrap()
            .fixed()
            .with_tag("health");
        assert!(event.is_fixed);
        assert_eq!(event.tags, vec!["health".to_string()]);
    }
}
