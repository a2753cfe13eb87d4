//! skillbox CLI: the main entry point.
//!
//! Commands:
//! - `check`    Evaluate a tool call against the loaded boxes
//! - `policy`   Print the merged global policy
//! - `list`     List loaded boxes
//! - `validate` Validate every box file
//! - `status`   Show configuration and load state

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "skillbox",
    about = "skillbox: behavioral contracts for agent skills",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Box directory (overrides config and SKILLBOX_CONTRACTS_DIR)
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a tool call against the loaded boxes
    Check {
        /// Tool name as the agent would invoke it
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        params: String,

        /// Override the enforcement mode (enforce | monitor)
        #[arg(short, long)]
        mode: Option<String>,
    },

    /// Print the merged global policy as JSON
    Policy,

    /// List loaded boxes
    List,

    /// Validate every box file
    Validate,

    /// Show configuration and load state
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = default_filter(cli.verbose);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let dir = cli.dir;
    match cli.command {
        Commands::Check { tool, params, mode } => {
            commands::check::run(dir, &tool, &params, mode.as_deref()).await?
        }
        Commands::Policy => commands::policy::run(dir)?,
        Commands::List => commands::boxes::list(dir)?,
        Commands::Validate => commands::boxes::validate(dir)?,
        Commands::Status => commands::status::run(dir)?,
    }

    Ok(())
}

fn default_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}
