//! Dependency graph commands for CLI.

use std::path::PathBuf;

use chronolint_core::{DependencyGraph, Task};
use clap::Subcommand;
use serde::Deserialize;

use super::{exit_with_graph_error, print_json, read_json};

#[derive(Subcommand)]
pub enum GraphAction {
    /// Print task ids in dependency order
    Order {
        /// JSON file with `{"tasks": [...]}` or a bare task array (stdin when omitted)
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Validate the dependency graph and print its size
    Check {
        /// JSON file with `{"tasks": [...]}` or a bare task array (stdin when omitted)
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum TaskInput {
    Wrapped { tasks: Vec<Task> },
    Bare(Vec<Task>),
}

impl TaskInput {
    pub(crate) fn into_tasks(self) -> Vec<Task> {
        match self {
            Self::Wrapped { tasks } | Self::Bare(tasks) => tasks,
        }
    }
}

pub fn run(action: GraphAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        GraphAction::Order { input } => {
            let tasks = read_json::<TaskInput>(input.as_ref())?.into_tasks();
            let graph =
                DependencyGraph::build(&tasks).unwrap_or_else(|e| exit_with_graph_error(&e));
            print_json(&graph.topological_order())?;
        }
        GraphAction::Check { input } => {
            let tasks = read_json::<TaskInput>(input.as_ref())?.into_tasks();
            let graph =
                DependencyGraph::build(&tasks).unwrap_or_else(|e| exit_with_graph_error(&e));
            print_json(&serde_json::json!({
                "valid": true,
                "task_count": graph.len(),
                "edge_count": graph.edge_count(),
            }))?;
        }
    }
    Ok(())
}
