//! # cadence CLI
//!
//! Command-line interface for Cadence, a conversational cycling assistant.
//!
//! ## Usage
//!
//! - `cadence` - Start the chat
//! - `cadence tools` - Show available tools

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod output;
mod shell;

use commands::{chat_command, tools_command};
use config::CliConfigLoader;

/// cadence - a conversational cycling assistant
#[derive(Parser)]
#[command(name = "cadence")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A conversational cycling assistant: rentals, climbs, weather and routes")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file or directory path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Show step and token statistics after each answer
    #[arg(long)]
    stats: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show available tools
    Tools,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config_loader = CliConfigLoader::new();
    if let Some(config_path) = cli.config {
        config_loader = config_loader.with_config_override(config_path);
    }

    match cli.command {
        Some(Commands::Tools) => tools_command().await,
        None => chat_command(config_loader, cli.stats).await,
    }
}
