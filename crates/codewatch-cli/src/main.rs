//! `cwatch` -- CLI binary for the codewatch verification-code watcher.
//!
//! Provides the following subcommands:
//!
//! - `cwatch watch` -- Watch a mailbox over IMAP IDLE and surface codes.
//! - `cwatch serve` -- Run the push webhook endpoint + history engine.
//! - `cwatch status` -- Show configuration status and diagnostics.
//! - `cwatch config` -- Show resolved configuration.

use clap::{Parser, Subcommand};

mod commands;
mod render;

/// codewatch verification-code watcher CLI.
#[derive(Parser)]
#[command(name = "cwatch", about = "codewatch verification-code watcher CLI", version)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Watch a mailbox over IMAP IDLE and surface verification codes.
    Watch(commands::watch::WatchArgs),

    /// Run the push webhook endpoint and history engine.
    Serve(commands::serve::ServeArgs),

    /// Show configuration status.
    Status(commands::status::StatusArgs),

    /// Show resolved configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCmd,
    },
}

/// Subcommands for `cwatch config`.
#[derive(Subcommand)]
enum ConfigCmd {
    /// Show the full resolved configuration.
    Show {
        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    match cli.command {
        Commands::Watch(args) => commands::watch::run(args).await?,
        Commands::Serve(args) => commands::serve::run(args).await?,
        Commands::Status(args) => commands::status::run(args).await?,
        Commands::Config { action } => match action {
            ConfigCmd::Show { config } => commands::config_cmd::show(config.as_deref())?,
        },
    }

    Ok(())
}
