//! Stride command-line client.
//!
//! Composition root: loads configuration, installs logging and dispatches to
//! a subcommand. Run with `cargo run -p stride-client -- <command>`.

mod commands;
mod logging;

use anyhow::Result;
use clap::Parser;
use client_bootstrap::ClientConfig;
use commands::{Fingerprint, Replay, SyncProgress};

/// Move-to-earn run recorder
#[derive(Parser)]
#[command(name = "stride")]
#[command(about = "Record, replay and submit runs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Replay a recorded track through a live session
    Replay(Replay),

    /// Print this host's device fingerprint
    Fingerprint(Fingerprint),

    /// Fetch relay-signed progress for a wallet
    Sync(SyncProgress),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = ClientConfig::from_env();
    let _log_guard = logging::setup_logging(config.log_dir.as_deref())?;

    match cli.command {
        Command::Replay(cmd) => cmd.execute(config).await,
        Command::Fingerprint(cmd) => cmd.execute(),
        Command::Sync(cmd) => cmd.execute(config).await,
    }
}
