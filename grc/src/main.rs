// grc/src/main.rs

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use grc_core::GrcError;
use miette::Diagnostic;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::Workspace;

#[tokio::main]
async fn main() -> ExitCode {
    // RUST_LOG=debug grc report generate ... to see the details.
    // Logs go to stderr so stdout stays parseable (--json).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast::<GrcError>() {
                Ok(grc) => {
                    eprintln!("❌ {}", grc);
                    if let Some(help) = grc.help() {
                        eprintln!("   help: {}", help);
                    }
                }
                Err(other) => eprintln!("❌ {:#}", other),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let project_dir = cli.project_dir;

    if let Commands::Init { name } = cli.command {
        return commands::init::execute(&project_dir, name);
    }

    let ws = Workspace::open(&project_dir)?;
    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Import { file } => commands::import::execute(&ws, &file).await,
        Commands::Report { action } => commands::report::execute(&ws, action).await,
        Commands::Dashboard { json } => commands::dashboard::execute(&ws, json).await,
        Commands::Snapshot { date } => commands::jobs::snapshot(&ws, date).await,
        Commands::Remind { date } => commands::jobs::remind(&ws, date).await,
        Commands::Dispatch => commands::jobs::dispatch(&ws).await,
        Commands::Schedule { action } => commands::schedule::execute(&ws, action).await,
        Commands::Daemon => commands::daemon::execute(&ws).await,
        Commands::Notifications {
            user,
            unread,
            mark_read,
        } => commands::notifications::execute(&ws, &user, unread, mark_read).await,
    }
}
