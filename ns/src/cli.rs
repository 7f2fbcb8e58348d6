//! CLI command definitions and subcommands

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// NotifySender - sequential invoice notification sender
#[derive(Parser)]
#[command(
    name = "ns",
    about = "Send pending invoice notifications one record at a time",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Process the queue once
    Run(RunArgs),

    /// Store account credentials in the session directory
    Login {
        /// Access token for the messaging account
        #[arg(long)]
        token: String,

        /// Sending phone number id
        #[arg(long = "phone-number-id")]
        phone_number_id: String,
    },

    /// Remove stored account credentials
    Logout,

    /// List available pacing profiles
    Profiles,
}

/// Overrides for a queue run
#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// Pacing profile to use (overrides config)
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Go through the queue without sending anything
    #[arg(long)]
    pub dry_run: bool,

    /// Record file (overrides config)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Attachment directory (overrides config)
    #[arg(long)]
    pub attachments: Option<PathBuf>,
}
