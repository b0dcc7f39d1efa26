//! Lint command for CLI.

use std::path::PathBuf;

use chronolint_core::{Config, Event, LintConfig, Linter};
use clap::Args;
use serde::Deserialize;

use super::{print_json, read_json};

#[derive(Args)]
pub struct LintArgs {
    /// JSON file with `{"events": [...]}` or a bare event array (stdin when omitted)
    #[arg(long)]
    input: Option<PathBuf>,
    /// Smallest gap reported as fragmentation, in minutes
    #[arg(long)]
    min_gap: Option<i64>,
    /// Largest gap reported as fragmentation, in minutes
    #[arg(long)]
    max_gap: Option<i64>,
    /// Print `{diagnostics, summary}` instead of the bare diagnostic list
    #[arg(long)]
    summary: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LintInput {
    Wrapped { events: Vec<Event> },
    Bare(Vec<Event>),
}

impl LintInput {
    fn into_events(self) -> Vec<Event> {
        match self {
            Self::Wrapped { events } | Self::Bare(events) => events,
        }
    }
}

pub fn run(args: LintArgs, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let defaults = config.lint_config()?;
    let thresholds = LintConfig::new(
        args.min_gap.unwrap_or(defaults.min_gap_minutes),
        args.max_gap.unwrap_or(defaults.max_gap_minutes),
    )?;
    let linter = Linter::with_config(thresholds)?;

    let events = read_json::<LintInput>(args.input.as_ref())?.into_events();
    tracing::debug!(event_count = events.len(), "lint input parsed");

    if args.summary {
        print_json(&linter.lint_report(&events)?)
    } else {
        print_json(&linter.lint(&events)?)
    }
}
