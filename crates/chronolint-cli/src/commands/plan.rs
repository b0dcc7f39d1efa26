//! Plan command for CLI.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use chronolint_core::{Config, CoreError, Event, FocusHours, PlanWindow, Planner, Task};
use clap::Args;
use serde::Deserialize;

use super::{exit_with_graph_error, print_json, read_json};

#[derive(Args)]
pub struct PlanArgs {
    /// JSON plan request (stdin when omitted)
    #[arg(long)]
    input: Option<PathBuf>,
    /// Daily capacity in minutes, overriding request and config
    #[arg(long)]
    capacity: Option<u32>,
}

/// Body of a plan request.
///
/// `events` keep their own `is_fixed` flag; everything in `fixed_events`
/// blocks time regardless of the flag.
#[derive(Debug, Deserialize)]
struct PlanRequest {
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    events: Vec<Event>,
    #[serde(default)]
    fixed_events: Vec<Event>,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    #[serde(default)]
    capacity_per_day: Option<u32>,
    #[serde(default)]
    focus_hours: Option<FocusHours>,
    #[serde(default)]
    dependency_graph: BTreeMap<String, Vec<String>>,
}

pub fn run(args: PlanArgs, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let request: PlanRequest = read_json(args.input.as_ref())?;

    let mut planner_config = config.planner_config()?;
    if let Some(capacity) = args.capacity.or(request.capacity_per_day) {
        planner_config.capacity_per_day = Some(capacity);
    }
    if request.focus_hours.is_some() {
        planner_config.focus_hours = request.focus_hours;
    }
    let planner = Planner::with_config(planner_config)?;

    let mut events = request.events;
    events.extend(request.fixed_events.into_iter().map(Event::fixed));

    tracing::debug!(
        task_count = request.tasks.len(),
        event_count = events.len(),
        extra_edges = request.dependency_graph.len(),
        "plan request parsed"
    );

    let window = PlanWindow::new(request.window_start, request.window_end);
    match planner.plan_with_edges(&request.tasks, &events, &window, &request.dependency_graph) {
        Ok(plan) => print_json(&plan),
        Err(CoreError::Graph(err)) => exit_with_graph_error(&err),
        Err(err) => Err(err.into()),
    }
}
