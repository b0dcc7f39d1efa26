//! Automatic planner for flexible tasks.
//!
//! This module places tasks into free time:
//! - Free windows come from the planning window minus fixed events
//! - Windows are cut into single-day slots (and to focus hours when set)
//! - Tasks are placed in dependency rounds; within a round the nearest
//!   deadline goes first, then the longer task, then the lower id
//! - Tasks that cannot be placed are reported with a reason code instead of
//!   failing the call
//!
//! Only dependency-graph errors and malformed inputs fail a planning call.

mod slots;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::graph::DependencyGraph;
use crate::schedule::Event;
use crate::task::{cmp_deadline, Task};
use crate::timeline::{Interval, Timeline};

use slots::{Shortfall, SlotBook};

/// Why a task was left out of a plan. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReasonCode {
    NoFeasibleWindow,
    DependencyNotReady,
    DeadlineExceeded,
    CapacityExceeded,
    CyclicDependency,
    MissingDependency,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoFeasibleWindow => "NoFeasibleWindow",
            Self::DependencyNotReady => "DependencyNotReady",
            Self::DeadlineExceeded => "DeadlineExceeded",
            Self::CapacityExceeded => "CapacityExceeded",
            Self::CyclicDependency => "CyclicDependency",
            Self::MissingDependency => "MissingDependency",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed allocation of one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedBlock {
    pub task_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl PlannedBlock {
    /// Get total duration in minutes
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    /// Check if this block overlaps with a time range
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && self.end_time > start
    }
}

/// A task that could not be placed, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnscheduledTask {
    pub task_id: String,
    pub reason_code: ReasonCode,
    pub message: String,
}

/// Result of one planning call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Ordered by `(start_time, task_id)`
    pub blocks: Vec<PlannedBlock>,
    /// Ordered by `(reason_code, task_id)`
    pub unscheduled: Vec<UnscheduledTask>,
}

impl Plan {
    pub fn block_for(&self, task_id: &str) -> Option<&PlannedBlock> {
        self.blocks.iter().find(|b| b.task_id == task_id)
    }

    pub fn unscheduled_for(&self, task_id: &str) -> Option<&UnscheduledTask> {
        self.unscheduled.iter().find(|u| u.task_id == task_id)
    }

    pub fn planned_minutes(&self) -> i64 {
        self.blocks.iter().map(PlannedBlock::duration_minutes).sum()
    }
}

/// `[window_start, window_end)` span to plan into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl PlanWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// # Errors
    /// Returns `InvalidWindow` unless `end > start`
    pub fn interval(&self) -> Result<Interval, ValidationError> {
        Interval::new(self.start, self.end).ok_or(ValidationError::InvalidWindow {
            start: self.start,
            end: self.end,
        })
    }
}

/// Daily band (UTC hours) outside of which nothing is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusHours {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl FocusHours {
    /// # Errors
    /// Returns `InvalidFocusHours` unless `start_hour < end_hour <= 24`
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.start_hour >= self.end_hour || self.end_hour > 24 {
            return Err(ValidationError::InvalidFocusHours {
                start: self.start_hour,
                end: self.end_hour,
            });
        }
        Ok(())
    }
}

/// Planner configuration, supplied per call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Maximum planned minutes per UTC day; unbounded when `None`
    #[serde(default)]
    pub capacity_per_day: Option<u32>,
    /// Restrict placement to these hours of each day
    #[serde(default)]
    pub focus_hours: Option<FocusHours>,
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(focus) = &self.focus_hours {
            focus.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum TaskState {
    Pending,
    Complete,
    Placed(Interval),
    Unscheduled,
}

impl TaskState {
    fn satisfies_dependents(&self) -> bool {
        matches!(self, Self::Complete | Self::Placed(_))
    }
}

/// Automatic planner for flexible tasks
#[derive(Debug, Clone, Default)]
pub struct Planner {
    config: PlannerConfig,
}

impl Planner {
    /// Create a planner with no capacity cap and no focus hours
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config
    ///
    /// # Errors
    /// Returns `InvalidFocusHours` for an invalid focus band
    pub fn with_config(config: PlannerConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plan `tasks` around the fixed events in `events`.
    ///
    /// # Errors
    /// - `InvalidWindow` / `MalformedInterval` for malformed inputs
    /// - `MissingDependency` / `CyclicDependency` / `DuplicateTask` when the
    ///   dependency graph is invalid; nothing is planned in that case
    pub fn plan(&self, tasks: &[Task], events: &[Event], window: &PlanWindow) -> Result<Plan> {
        self.plan_with_edges(tasks, events, window, &BTreeMap::new())
    }

    /// Like [`plan`](Self::plan), with extra `task id -> dependency ids` edges
    pub fn plan_with_edges(
        &self,
        tasks: &[Task],
        events: &[Event],
        window: &PlanWindow,
        extra_edges: &BTreeMap<String, Vec<String>>,
    ) -> Result<Plan> {
        let window = window.interval()?;
        let graph = DependencyGraph::build_with_edges(tasks, extra_edges)?;
        let timeline = Timeline::new(events)?;

        let free = timeline.free_windows(window);
        let mut book = SlotBook::new(&free, self.config.focus_hours, self.config.capacity_per_day);
        tracing::debug!(
            window_start = %window.start,
            window_end = %window.end,
            free_windows = free.len(),
            free_minutes = book.free_minutes(),
            "planning window prepared"
        );

        let by_id: BTreeMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();
        let mut states: BTreeMap<&str, TaskState> = tasks
            .iter()
            .map(|t| {
                let state = if t.is_complete() {
                    TaskState::Complete
                } else {
                    TaskState::Pending
                };
                (t.id.as_str(), state)
            })
            .collect();

        let mut plan = Plan::default();

        loop {
            let mut ready: Vec<&Task> = graph
                .topological_order()
                .into_iter()
                .filter(|id| matches!(states.get(id), Some(TaskState::Pending)))
                .filter(|id| {
                    graph
                        .dependencies_of(id)
                        .iter()
                        .all(|dep| states.get(dep).is_some_and(TaskState::satisfies_dependents))
                })
                .filter_map(|id| by_id.get(id).copied())
                .collect();

            if ready.is_empty() {
                break;
            }

            ready.sort_by(|a, b| {
                cmp_deadline(a.deadline, b.deadline)
                    .then_with(|| b.estimated_duration_minutes.cmp(&a.estimated_duration_minutes))
                    .then_with(|| a.id.cmp(&b.id))
            });

            for task in ready {
                let earliest = graph
                    .dependencies_of(&task.id)
                    .iter()
                    .filter_map(|dep| match states.get(dep) {
                        Some(TaskState::Placed(block)) => Some(block.end),
                        _ => None,
                    })
                    .max();

                match book.place(task.estimated_duration_minutes, earliest, task.deadline) {
                    Ok(block) => {
                        tracing::debug!(
                            task_id = %task.id,
                            start = %block.start,
                            end = %block.end,
                            "task placed"
                        );
                        states.insert(task.id.as_str(), TaskState::Placed(block));
                        plan.blocks.push(PlannedBlock {
                            task_id: task.id.clone(),
                            start_time: block.start,
                            end_time: block.end,
                        });
                    }
                    Err(shortfall) => {
                        let reason = shortfall.reason_code();
                        tracing::debug!(task_id = %task.id, reason = %reason, "task unscheduled");
                        states.insert(task.id.as_str(), TaskState::Unscheduled);
                        plan.unscheduled.push(UnscheduledTask {
                            task_id: task.id.clone(),
                            reason_code: reason,
                            message: shortfall_message(shortfall, task.estimated_duration_minutes),
                        });
                    }
                }
            }
        }

        // Whatever is still pending sits behind an unscheduled dependency.
        for (id, state) in &states {
            if !matches!(state, TaskState::Pending) {
                continue;
            }
            let unmet: Vec<&str> = graph
                .dependencies_of(id)
                .into_iter()
                .filter(|dep| !states.get(dep).is_some_and(TaskState::satisfies_dependents))
                .collect();
            plan.unscheduled.push(UnscheduledTask {
                task_id: id.to_string(),
                reason_code: ReasonCode::DependencyNotReady,
                message: format!("Blocked by unmet dependencies: {}", unmet.join(", ")),
            });
        }

        plan.blocks.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then_with(|| a.task_id.cmp(&b.task_id))
        });
        plan.unscheduled.sort_by(|a, b| {
            a.reason_code
                .cmp(&b.reason_code)
                .then_with(|| a.task_id.cmp(&b.task_id))
        });

        tracing::info!(
            task_count = tasks.len(),
            fixed_events = timeline.occupied_intervals().len(),
            placed = plan.blocks.len(),
            unscheduled = plan.unscheduled.len(),
            "plan computed"
        );

        Ok(plan)
    }
}

fn shortfall_message(shortfall: Shortfall, minutes: u32) -> String {
    match shortfall {
        Shortfall::NoWindow => {
            format!("No free window of {minutes} minutes within the planning window.")
        }
        Shortfall::PastDeadline(deadline) => format!(
            "Every free window long enough for {minutes} minutes ends after the deadline {}.",
            deadline.to_rfc3339()
        ),
        Shortfall::OverCapacity(cap) => {
            format!("Daily capacity of {cap} minutes leaves no room for {minutes} minutes.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, minute, 0).unwrap()
    }

    fn task(id: &str, minutes: u32) -> Task {
        Task::try_new(id, format!("Task {id}"), minutes).unwrap()
    }

    fn fixed(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Event {
        Event::try_new(id, format!("Event {id}"), start, end).unwrap().fixed()
    }

    fn workday() -> PlanWindow {
        PlanWindow::new(at(1, 9, 0), at(1, 17, 0))
    }

    #[test]
    fn empty_inputs_give_empty_plan() {
        let plan = Planner::new().plan(&[], &[], &workday()).unwrap();
        assert_eq!(plan, Plan::default());
    }

    #[test]
    fn invalid_window_is_rejected() {
        let window = PlanWindow::new(at(1, 17, 0), at(1, 9, 0));
        let err = Planner::new().plan(&[], &[], &window).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::Validation(ValidationError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn invalid_focus_hours_are_rejected() {
        let config = PlannerConfig {
            capacity_per_day: None,
            focus_hours: Some(FocusHours {
                start_hour: 17,
                end_hour: 9,
            }),
        };
        assert!(Planner::with_config(config).is_err());
    }

    #[test]
    fn tasks_fill_window_in_deadline_order() {
        let tasks = vec![
            task("later", 60).with_deadline(at(1, 17, 0)),
            task("sooner", 60).with_deadline(at(1, 12, 0)),
            task("whenever", 60),
        ];
        let plan = Planner::new().plan(&tasks, &[], &workday()).unwrap();

        let ids: Vec<&str> = plan.blocks.iter().map(|b| b.task_id.as_str()).collect();
        assert_eq!(ids, vec!["sooner", "later", "whenever"]);
        assert_eq!(plan.blocks[0].start_time, at(1, 9, 0));
        assert_eq!(plan.blocks[2].end_time, at(1, 12, 0));
        assert!(plan.unscheduled.is_empty());
    }

    #[test]
    fn longer_task_wins_deadline_tie() {
        let deadline = at(1, 17, 0);
        let tasks = vec![
            task("short", 30).with_deadline(deadline),
            task("long", 90).with_deadline(deadline),
        ];
        let plan = Planner::new().plan(&tasks, &[], &workday()).unwrap();
        assert_eq!(plan.blocks[0].task_id, "long");
        assert_eq!(plan.block_for("short").unwrap().start_time, at(1, 10, 30));
    }

    #[test]
    fn fixed_events_are_avoided() {
        let events = vec![fixed("meeting", at(1, 9, 0), at(1, 11, 0))];
        let tasks = vec![task("a", 120)];
        let plan = Planner::new().plan(&tasks, &events, &workday()).unwrap();

        let block = plan.block_for("a").unwrap();
        assert_eq!(block.start_time, at(1, 11, 0));
        assert!(!block.overlaps(at(1, 9, 0), at(1, 11, 0)));
    }

    #[test]
    fn flexible_events_do_not_block() {
        let mut flexible = fixed("maybe", at(1, 9, 0), at(1, 11, 0));
        flexible.is_fixed = false;
        let plan = Planner::new()
            .plan(&[task("a", 60)], &[flexible], &workday())
            .unwrap();
        assert_eq!(plan.blocks[0].start_time, at(1, 9, 0));
    }

    #[test]
    fn dependent_waits_for_dependency_even_with_earlier_deadline() {
        let events = vec![fixed("standup", at(1, 9, 0), at(1, 10, 0))];
        let tasks = vec![
            task("A", 60).with_deadline(at(1, 17, 0)),
            task("B", 60).with_deadline(at(1, 15, 0)).depends_on("A"),
        ];
        let plan = Planner::new().plan(&tasks, &events, &workday()).unwrap();

        let a = plan.block_for("A").unwrap();
        let b = plan.block_for("B").unwrap();
        assert_eq!(a.start_time, at(1, 10, 0));
        assert!(b.start_time >= a.end_time);
        assert_eq!(b.start_time, at(1, 11, 0));
    }

    #[test]
    fn dependent_can_start_after_dependency_in_split_slot() {
        // "x" takes the morning first; "b" must still start after "a"
        let tasks = vec![
            task("a", 60).with_deadline(at(1, 10, 0)),
            task("b", 30).depends_on("a"),
            task("x", 120).with_deadline(at(1, 16, 0)),
        ];
        let plan = Planner::new().plan(&tasks, &[], &workday()).unwrap();

        let a = plan.block_for("a").unwrap();
        let b = plan.block_for("b").unwrap();
        assert_eq!(a.start_time, at(1, 9, 0));
        assert_eq!(plan.block_for("x").unwrap().start_time, at(1, 10, 0));
        assert_eq!(b.start_time, at(1, 12, 0));
    }

    #[test]
    fn completed_dependencies_are_satisfied_and_not_planned() {
        let tasks = vec![
            task("done", 60).with_status(crate::task::TaskStatus::completed()),
            task("next", 60).depends_on("done"),
        ];
        let plan = Planner::new().plan(&tasks, &[], &workday()).unwrap();
        assert!(plan.block_for("done").is_none());
        assert!(plan.unscheduled_for("done").is_none());
        assert_eq!(plan.block_for("next").unwrap().start_time, at(1, 9, 0));
    }

    #[test]
    fn unscheduled_dependency_blocks_dependents_transitively() {
        let tasks = vec![
            task("huge", 600),
            task("mid", 30).depends_on("huge"),
            task("leaf", 30).depends_on("mid"),
        ];
        let plan = Planner::new().plan(&tasks, &[], &workday()).unwrap();

        assert!(plan.blocks.is_empty());
        let reasons: Vec<(&str, ReasonCode)> = plan
            .unscheduled
            .iter()
            .map(|u| (u.task_id.as_str(), u.reason_code))
            .collect();
        assert_eq!(
            reasons,
            vec![
                ("huge", ReasonCode::NoFeasibleWindow),
                ("leaf", ReasonCode::DependencyNotReady),
                ("mid", ReasonCode::DependencyNotReady),
            ]
        );
        assert_eq!(
            plan.unscheduled_for("mid").unwrap().message,
            "Blocked by unmet dependencies: huge"
        );
    }

    #[test]
    fn deadline_exceeded_when_only_late_windows_fit() {
        let events = vec![fixed("meeting", at(1, 9, 0), at(1, 10, 0))];
        let tasks = vec![task("urgent", 90).with_deadline(at(1, 11, 0))];
        let plan = Planner::new().plan(&tasks, &events, &workday()).unwrap();

        let unscheduled = plan.unscheduled_for("urgent").unwrap();
        assert_eq!(unscheduled.reason_code, ReasonCode::DeadlineExceeded);
        assert!(unscheduled.message.contains(&at(1, 11, 0).to_rfc3339()));
    }

    #[test]
    fn no_window_message_names_the_duration() {
        let events = vec![fixed("meeting", at(1, 10, 0), at(1, 17, 0))];
        let tasks = vec![task("long", 120)];
        let window = PlanWindow::new(at(1, 9, 0), at(1, 18, 0));
        let plan = Planner::new().plan(&tasks, &events, &window).unwrap();

        let unscheduled = plan.unscheduled_for("long").unwrap();
        assert_eq!(unscheduled.reason_code, ReasonCode::NoFeasibleWindow);
        assert_eq!(
            unscheduled.message,
            "No free window of 120 minutes within the planning window."
        );
    }

    #[test]
    fn capacity_exceeded_when_cap_is_the_only_obstacle() {
        let config = PlannerConfig {
            capacity_per_day: Some(180),
            focus_hours: None,
        };
        let tasks = vec![
            task("task-a", 120).with_deadline(at(1, 16, 0)),
            task("task-b", 120).with_deadline(at(1, 16, 0)),
        ];
        let plan = Planner::with_config(config)
            .unwrap()
            .plan(&tasks, &[], &workday())
            .unwrap();

        assert_eq!(plan.blocks.len(), 1);
        assert_eq!(plan.blocks[0].task_id, "task-a");
        let b = plan.unscheduled_for("task-b").unwrap();
        assert_eq!(b.reason_code, ReasonCode::CapacityExceeded);
        assert!(b.message.contains("180"));
    }

    #[test]
    fn focus_hours_and_capacity_span_days() {
        let config = PlannerConfig {
            capacity_per_day: Some(240),
            focus_hours: Some(FocusHours {
                start_hour: 9,
                end_hour: 17,
            }),
        };
        let window = PlanWindow::new(at(1, 0, 0), at(3, 0, 0));
        let tasks = vec![task("one", 240), task("two", 240), task("three", 240)];
        let plan = Planner::with_config(config)
            .unwrap()
            .plan(&tasks, &[], &window)
            .unwrap();

        assert_eq!(plan.blocks.len(), 2);
        assert_eq!(plan.blocks[0].start_time, at(1, 9, 0));
        assert_eq!(plan.blocks[1].start_time, at(2, 9, 0));
        assert_eq!(plan.unscheduled[0].reason_code, ReasonCode::CapacityExceeded);
        assert_eq!(plan.planned_minutes(), 480);
    }

    #[test]
    fn graph_errors_abort_planning() {
        let tasks = vec![task("a", 30).depends_on("missing")];
        let err = Planner::new().plan(&tasks, &[], &workday()).unwrap_err();
        assert!(matches!(err, crate::error::CoreError::Graph(_)));

        let cyclic = vec![task("a", 30).depends_on("b"), task("b", 30).depends_on("a")];
        let err = Planner::new().plan(&cyclic, &[], &workday()).unwrap_err();
        assert!(err.to_string().contains("Cyclic dependency"));
    }

    #[test]
    fn extra_edges_order_tasks() {
        let tasks = vec![task("ship", 60).with_deadline(at(1, 10, 0)), task("prepare", 60)];
        let mut edges = BTreeMap::new();
        edges.insert("ship".to_string(), vec!["prepare".to_string()]);

        let plan = Planner::new()
            .plan_with_edges(&tasks, &[], &workday(), &edges)
            .unwrap();
        assert_eq!(plan.block_for("prepare").unwrap().start_time, at(1, 9, 0));
        assert_eq!(
            plan.unscheduled_for("ship").unwrap().reason_code,
            ReasonCode::DeadlineExceeded
        );
    }

    #[test]
    fn blocks_never_overlap_each_other() {
        let tasks: Vec<Task> = (0..12).map(|i| task(&format!("t{i:02}"), 25 + i * 5)).collect();
        let events = vec![
            fixed("lunch", at(1, 12, 0), at(1, 13, 0)),
            fixed("sync", at(1, 15, 0), at(1, 15, 30)),
        ];
        let plan = Planner::new().plan(&tasks, &events, &workday()).unwrap();

        for (i, a) in plan.blocks.iter().enumerate() {
            for b in &plan.blocks[i + 1..] {
                assert!(!a.overlaps(b.start_time, b.end_time), "{a:?} overlaps {b:?}");
            }
            for e in &events {
                assert!(!a.overlaps(e.start_time, e.end_time));
            }
            assert!(a.start_time >= at(1, 9, 0) && a.end_time <= at(1, 17, 0));
        }
        assert_eq!(plan.blocks.len() + plan.unscheduled.len(), tasks.len());
    }

    #[test]
    fn plan_serializes_reason_codes_verbatim() {
        let plan = Planner::new()
            .plan(&[task("big", 24 * 60)], &[], &workday())
            .unwrap();
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["unscheduled"][0]["reason_code"], "NoFeasibleWindow");
        assert_eq!(Duration::minutes(plan.planned_minutes()), Duration::zero());
    }
}
