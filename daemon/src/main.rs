//! Menuwatch daemon.
//!
//! Thin process shell: parses the command line, installs logging, loads
//! configuration and hands off to a command. Monitoring logic lives in the
//! `crates/` directory.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "menuwatch", about = "Menuwatch - disabled menu item monitor", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Config file (overrides default ~/.config/menuwatch/config.toml).
    #[arg(long, global = true, env = "MENUWATCH_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Monitor the target page until interrupted (default).
    Run,
    /// Alert recipient management.
    Recipients {
        #[command(subcommand)]
        action: commands::recipients::RecipientAction,
    },
}

/// Initialize tracing subscriber for logging
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,menuwatch=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    info!("Starting menuwatch v{}", env!("CARGO_PKG_VERSION"));

    let config = commands::load_config(cli.config.as_deref())?;
    match cli.command.unwrap_or(Command::Run) {
        Command::Run => commands::monitor::run(config).await,
        Command::Recipients { action } => commands::recipients::handle(&config, action).await,
    }
}
