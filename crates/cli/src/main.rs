use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sluice_core::mode::Mode;
use sluice_core::orchestrator::{Orchestrator, OrchestratorConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Sluice - A front-end build orchestrator
#[derive(Parser)]
#[command(name = "sluice")]
#[command(about = "Compose and run front-end build tasks")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Path to the project root (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    /// Build mode, overriding SLUICE_ENV (development or production)
    #[arg(short, long, global = true)]
    mode: Option<String>,

    /// Task to run when no subcommand is given
    #[arg(default_value = "default")]
    task: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a task and its prerequisites
    Run {
        /// Task name
        #[arg(default_value = "default")]
        task: String,
    },
    /// Show the execution plan for a task without running it
    Plan {
        /// Task name
        #[arg(default_value = "default")]
        task: String,
    },
    /// List registered tasks
    List,
    /// Show the task graph
    Graph,
    /// Print the JSON schema of sluice.yml
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sluice_core=info,sluice_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Schema needs no project
    if let Some(Commands::Schema) = cli.command {
        return commands::schema::execute();
    }

    let mut config = OrchestratorConfig::new(cli.root);
    if let Some(mode) = cli.mode.as_deref() {
        config = config.with_mode(Mode::parse(Some(mode)));
    }
    let orchestrator = Orchestrator::new(config)
        .map_err(|e| anyhow::anyhow!("Failed to load project: {}", e))?;

    // Execute command (CLI layer only handles presentation)
    match cli.command {
        None => commands::run::execute(&orchestrator, &cli.task).await,
        Some(Commands::Run { task }) => commands::run::execute(&orchestrator, &task).await,
        Some(Commands::Plan { task }) => commands::plan::execute(&orchestrator, &task),
        Some(Commands::List) => commands::list::execute(&orchestrator),
        Some(Commands::Graph) => commands::graph::execute(&orchestrator),
        Some(Commands::Schema) => commands::schema::execute(),
    }
}
