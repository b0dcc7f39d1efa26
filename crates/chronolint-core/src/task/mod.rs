//! Task types for planning.
//!
//! A task carries a duration estimate, an optional deadline and a set of
//! tasks it depends on. Dependencies arrive either as a delimited string or as
//! a list; both normalize into [`DependencyIds`] at deserialization time, so
//! nothing downstream can tell which form was used.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Free-form task status label.
///
/// `COMPLETED` and `DONE` (any case) mark a task complete; every other label
/// is treated as open work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskStatus(String);

impl TaskStatus {
    pub const TODO: &'static str = "TODO";
    pub const IN_PROGRESS: &'static str = "IN_PROGRESS";
    pub const COMPLETED: &'static str = "COMPLETED";

    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn todo() -> Self {
        Self::new(Self::TODO)
    }

    pub fn completed() -> Self {
        Self::new(Self::COMPLETED)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this status satisfies dependents without being planned
    pub fn is_complete(&self) -> bool {
        let label = self.0.trim();
        label.eq_ignore_ascii_case(Self::COMPLETED) || label.eq_ignore_ascii_case("DONE")
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::todo()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wire forms accepted for a dependency set.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DependencyInput {
    /// `"a, b; c"` - split on commas, semicolons and whitespace
    Delimited(String),
    /// `["a", "b"]`
    List(Vec<String>),
}

/// Normalized set of task ids a task depends on.
///
/// Always serializes as a sorted list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<DependencyInput>", into = "Vec<String>")]
pub struct DependencyIds(BTreeSet<String>);

impl DependencyIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a delimited id string
    pub fn parse(raw: &str) -> Self {
        raw.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .collect()
    }

    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        let id = id.trim();
        if id.is_empty() {
            return false;
        }
        self.0.insert(id.to_string())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Ids in ascending order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for DependencyIds {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut ids = Self::new();
        for id in iter {
            ids.insert(id.as_ref());
        }
        ids
    }
}

impl From<DependencyInput> for DependencyIds {
    fn from(input: DependencyInput) -> Self {
        match input {
            DependencyInput::Delimited(raw) => Self::parse(&raw),
            DependencyInput::List(items) => items.into_iter().collect(),
        }
    }
}

impl From<Option<DependencyInput>> for DependencyIds {
    fn from(input: Option<DependencyInput>) -> Self {
        input.map(Self::from).unwrap_or_default()
    }
}

impl From<DependencyIds> for Vec<String> {
    fn from(ids: DependencyIds) -> Self {
        ids.0.into_iter().collect()
    }
}

/// A flexible unit of work to be planned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    pub estimated_duration_minutes: u32,
    #[serde(default)]
    pub dependency_ids: DependencyIds,
}

impl Task {
    /// Create a new open task with no deadline and no dependencies
    ///
    /// # Errors
    /// Returns an error if `content` is blank or the duration is zero
    pub fn try_new(
        id: impl Into<String>,
        content: impl AsRef<str>,
        estimated_duration_minutes: u32,
    ) -> Result<Self, ValidationError> {
        let content = content.as_ref().trim();
        if content.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "content".to_string(),
                message: "content must not be empty".to_string(),
            });
        }
        if estimated_duration_minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "estimated_duration_minutes".to_string(),
                message: "estimated_duration_minutes must be greater than 0".to_string(),
            });
        }
        Ok(Self {
            id: id.into(),
            content: content.to_string(),
            tags: Vec::new(),
            status: TaskStatus::default(),
            deadline: None,
            estimated_duration_minutes,
            dependency_ids: DependencyIds::new(),
        })
    }

    /// Set deadline
    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set status
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Add a dependency on another task
    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.dependency_ids.insert(id);
        self
    }

    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }
}

/// Compare optional deadlines with `None` sorting after every deadline.
pub fn cmp_deadline(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Deterministic listing order: deadline ascending (no deadline last), then id.
pub fn listing_order(tasks: &[Task]) -> Vec<&Task> {
    let mut ordered: Vec<&Task> = tasks.iter().collect();
    ordered.sort_by(|a, b| cmp_deadline(a.deadline, b.deadline).then_with(|| a.id.cmp(&b.id)));
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn string_and_list_forms_normalize_identically() {
        let from_string: Task = serde_json::from_str(
            r#"{"id": "t", "estimated_duration_minutes": 30, "dependency_ids": "b, a;c  a"}"#,
        )
        .unwrap();
        let from_list: Task = serde_json::from_str(
            r#"{"id": "t", "estimated_duration_minutes": 30, "dependency_ids": ["c", " a ", "b", "a"]}"#,
        )
        .unwrap();

        assert_eq!(from_string.dependency_ids, from_list.dependency_ids);
        assert_eq!(
            from_string.dependency_ids.iter().collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn missing_or_null_dependencies_are_empty() {
        let absent: Task =
            serde_json::from_str(r#"{"id": "t", "estimated_duration_minutes": 30}"#).unwrap();
        let null: Task = serde_json::from_str(
            r#"{"id": "t", "estimated_duration_minutes": 30, "dependency_ids": null}"#,
        )
        .unwrap();
        let blank: Task = serde_json::from_str(
            r#"{"id": "t", "estimated_duration_minutes": 30, "dependency_ids": " , "}"#,
        )
        .unwrap();

        assert!(absent.dependency_ids.is_empty());
        assert!(null.dependency_ids.is_empty());
        assert!(blank.dependency_ids.is_empty());
        assert_eq!(absent.status.as_str(), TaskStatus::TODO);
    }

    #[test]
    fn dependencies_always_serialize_as_list() {
        let task: Task = serde_json::from_str(
            r#"{"id": "t", "estimated_duration_minutes": 30, "dependency_ids": "x,y"}"#,
        )
        .unwrap();
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["dependency_ids"], serde_json::json!(["x", "y"]));
    }

    #[test]
    fn completion_is_case_insensitive() {
        assert!(TaskStatus::new("completed").is_complete());
        assert!(TaskStatus::new("Done").is_complete());
        assert!(!TaskStatus::new("IN_PROGRESS").is_complete());
        assert!(!TaskStatus::default().is_complete());
    }

    #[test]
    fn try_new_validates_shape() {
        assert!(Task::try_new("t", "  ", 30).is_err());
        assert!(Task::try_new("t", "Write", 0).is_err());

        let task = Task::try_new("t", " Write ", 30)
            .unwrap()
            .depends_on("a")
            .with_deadline(day(2));
        assert_eq!(task.content, "Write");
        assert!(task.dependency_ids.contains("a"));
        assert_eq!(task.deadline, Some(day(2)));
    }

    #[test]
    fn listing_order_puts_null_deadlines_last() {
        let tasks = vec![
            Task::try_new("b", "B", 10).unwrap(),
            Task::try_new("c", "C", 10).unwrap().with_deadline(day(3)),
            Task::try_new("a", "A", 10).unwrap(),
            Task::try_new("d", "D", 10).unwrap().with_deadline(day(1)),
        ];
        let ids: Vec<&str> = listing_order(&tasks).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "c", "a", "b"]);
    }
}
