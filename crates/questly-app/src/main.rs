//! # Questly
//!
//! Command-line front end for the Questly quest board: add quests, complete
//! them, and watch rank, streak and badges move.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::Commands;
use crate::config::AppConfig;

/// Gamified quest board with ranks, streaks and badges.
#[derive(Parser)]
#[command(name = "questly")]
#[command(version)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Main entry point.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(config.log_filter.parse()?))
        .init();

    debug!("Questly {}", env!("CARGO_PKG_VERSION"));
    commands::run(cli.command, &config)
}
