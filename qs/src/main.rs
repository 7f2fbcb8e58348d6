use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use queuestore::cli::{Cli, Command};
use queuestore::config::Config;
use queuestore::{RecordStore, ResetFilter, Status};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();
    Ok(())
}

fn colorize(status: &str) -> ColoredString {
    match Status::from(status) {
        Status::Pending => status.cyan(),
        Status::Sent => status.green(),
        Status::SkippedNoReceipt => status.yellow(),
        Status::Other(_) => status.dimmed(),
        _ => status.red(),
    }
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let store = RecordStore::new(cli.store.unwrap_or(config.paths.store_path));

    info!("queuestore using {}", store.path().display());

    match cli.command {
        Command::List { status } => {
            let records = store.load()?;
            let wanted = status.map(Status::from);
            let mut shown = 0;
            for (idx, record) in records.iter().enumerate() {
                if wanted.is_some() && record.status() != wanted {
                    continue;
                }
                shown += 1;
                println!(
                    "{:>4} {:<20} {} {}",
                    idx.to_string().dimmed(),
                    colorize(record.status_text()),
                    record.label(),
                    record.filename().unwrap_or("-").dimmed()
                );
            }
            if shown == 0 {
                println!("No records found");
            }
        }
        Command::Stats => {
            let records = store.load()?;
            let summary = queuestore::summarize(&records);
            println!("Store: {}", store.path().display().to_string().cyan());
            println!("  Records: {}", summary.total);
            for (status, count) in &summary.by_status {
                println!("  {:<20} {}", colorize(status), count);
            }
        }
        Command::Reset { statuses, name } => {
            let mut records = store.load()?;
            let mut filter = ResetFilter {
                name,
                ..Default::default()
            };
            if !statuses.is_empty() {
                filter.statuses = statuses.into_iter().map(Status::from).collect();
            }
            let changed = queuestore::reset(&mut records, &filter);
            if changed > 0 {
                store.save(&records)?;
            }
            println!("{} Reset {} record(s) to PENDING", "✓".green(), changed);
        }
    }

    Ok(())
}
