//! CLI argument definitions using clap
//!
//! This module contains the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// frais - Build and export expense reports ("notes de frais")
#[derive(Parser)]
#[command(name = "frais")]
#[command(about = "Expense report aggregation and PDF export", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Company directory TOML file (addresses, logos)
    #[arg(long, global = true)]
    pub companies: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render and merge the full report PDF from a session file
    Export {
        /// Session JSON file (lines, company, attachment paths)
        #[arg(short, long)]
        session: PathBuf,

        /// Output PDF path (defaults to the suggested NDF filename)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Reference date for the report period (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Show per-category totals for a session file
    Totals {
        /// Session JSON file
        #[arg(short, long)]
        session: PathBuf,

        /// Emit totals as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List known companies
    Companies,
}
