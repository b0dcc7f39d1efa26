//! Task listing commands for CLI.

use std::path::PathBuf;

use chronolint_core::listing_order;
use clap::Subcommand;

use super::graph::TaskInput;
use super::{print_json, read_json};

#[derive(Subcommand)]
pub enum TaskAction {
    /// List tasks by deadline (none last), then id
    List {
        /// JSON file with `{"tasks": [...]}` or a bare task array (stdin when omitted)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Leave out completed tasks
        #[arg(long)]
        open: bool,
    },
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TaskAction::List { input, open } => {
            let tasks = read_json::<TaskInput>(input.as_ref())?.into_tasks();
            let listed: Vec<_> = listing_order(&tasks)
                .into_iter()
                .filter(|t| !open || !t.is_complete())
                .collect();
            print_json(&listed)?;
        }
    }
    Ok(())
}
