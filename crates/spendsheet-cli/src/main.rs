//! spendsheet - track expenses and monthly budgets from the terminal.
//!
//! Records live in a remote spreadsheet endpoint when one is configured and
//! are mirrored to a local cache, which is also used on its own when the
//! endpoint is missing or unreachable.

mod commands;
mod render;

use std::io;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use spendsheet_core::models::period::today;
use spendsheet_core::Config;

use commands::Cli;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // RUST_LOG controls the level, e.g. RUST_LOG=spendsheet_core=debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let today = today();
    let command = Cli::parse().into_command(today)?;

    let mut config = Config::load()?;
    config.apply_env_overrides();
    commands::run(command, &config, today).await
}
