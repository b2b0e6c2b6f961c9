//! frais CLI - Expense report builder
//!
//! Usage:
//!   frais export --session juin.json        Render and merge the report PDF
//!   frais totals --session juin.json        Show per-category totals
//!   frais companies                         List known companies

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let directory = commands::load_directory(cli.companies.as_deref())?;

    match cli.command {
        Commands::Export {
            session,
            output,
            date,
        } => commands::cmd_export(&session, output.as_deref(), date.as_deref(), &directory),
        Commands::Totals { session, json } => commands::cmd_totals(&session, json, &directory),
        Commands::Companies => commands::cmd_companies(&directory),
    }
}
