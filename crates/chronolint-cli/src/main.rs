use chronolint_core::storage::LoggingSection;
use chronolint_core::Config;
use clap::{CommandFactory, Parser, Subcommand};

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "chronolint", version, about = "Timeline linter and task planner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report overlaps and fragmentation in a set of events
    Lint(commands::lint::LintArgs),
    /// Place tasks into free time around fixed events
    Plan(commands::plan::PlanArgs),
    /// Dependency graph inspection
    Graph {
        #[command(subcommand)]
        action: commands::graph::GraphAction,
    },
    /// Task listing
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    let loaded = Config::load();
    let fallback = LoggingSection::default();
    logging::init(loaded.as_ref().map_or(&fallback, |config| &config.logging));

    let result = match cli.command {
        Commands::Lint(args) => match loaded {
            Ok(config) => commands::lint::run(args, &config),
            Err(e) => Err(e.into()),
        },
        Commands::Plan(args) => match loaded {
            Ok(config) => commands::plan::run(args, &config),
            Err(e) => Err(e.into()),
        },
        Commands::Graph { action } => commands::graph::run(action),
        Commands::Task { action } => commands::task::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "chronolint",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
