//! CLI argument parsing for queuestore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "qs")]
#[command(author, version, about = "Inspect and reset the invoice notification queue", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the record file (overrides config)
    #[arg(short, long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List records in queue order
    List {
        /// Only show records with this status
        #[arg(long = "status")]
        status: Option<String>,
    },

    /// Show record counts per status
    Stats,

    /// Put settled records back to PENDING so the next run retries them
    Reset {
        /// Statuses to reset (default: FAILED)
        #[arg(long = "status", num_args = 1..)]
        statuses: Vec<String>,

        /// Only reset records with this name
        #[arg(short, long)]
        name: Option<String>,
    },
}
