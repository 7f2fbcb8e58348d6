//! NotifySender - CLI entry point

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use notifysender::cli::{Cli, Command, RunArgs};
use notifysender::config::Config;
use notifysender::messaging::create_client;
use notifysender::pacing::PacingProfile;
use notifysender::processor::RecordProcessor;
use notifysender::queue::QueueRunner;
use notifysender::session::{Credentials, Session};
use queuestore::RecordStore;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("notifysender")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    let log_file = fs::File::create(log_dir.join("ns.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        None => cmd_run(config, RunArgs::default()).await,
        Some(Command::Run(args)) => cmd_run(config, args).await,
        Some(Command::Login {
            token,
            phone_number_id,
        }) => cmd_login(&config, &token, &phone_number_id),
        Some(Command::Logout) => cmd_logout(&config),
        Some(Command::Profiles) => cmd_profiles(&config),
    }
}

async fn cmd_run(mut config: Config, args: RunArgs) -> Result<()> {
    if let Some(store) = args.store {
        config.paths.store_path = store;
    }
    if let Some(dir) = args.attachments {
        config.paths.attachment_dir = dir;
    }
    if let Some(profile) = args.profile {
        config.pacing.profile = profile;
    }
    if args.dry_run {
        config.messaging.backend = "dry-run".to_string();
    }

    // Nothing is delivered on a dry run, so nothing is recorded and nobody waits
    let dry_run = config.messaging.backend == "dry-run";
    let pacing = if dry_run {
        PacingProfile::immediate()
    } else {
        config.pacing.active()?
    };
    info!(
        store = %config.paths.store_path.display(),
        attachments = %config.paths.attachment_dir.display(),
        backend = %config.messaging.backend,
        profile = %config.pacing.profile,
        dry_run,
        "Starting run"
    );

    fs::create_dir_all(&config.paths.session_dir).context(format!(
        "Failed to create session directory {}",
        config.paths.session_dir.display()
    ))?;
    let credentials = Credentials::load(&config.paths.session_dir);
    let client = create_client(&config.messaging, credentials.as_ref())?;

    let session = match Session::open(client, Duration::from_millis(config.messaging.auth_timeout_ms)).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{} {}", "❌".red(), e.to_string().red());
            return Err(e).context("Could not open messaging session");
        }
    };

    let processor = RecordProcessor::new(
        pacing,
        &config.paths.attachment_dir,
        Duration::from_millis(config.messaging.request_timeout_ms),
    );
    let mut runner = QueueRunner::new(RecordStore::new(&config.paths.store_path), processor);
    if dry_run {
        runner = runner.read_only();
    }

    let result = runner.run(session.client()).await;
    if let Err(e) = session.close().await {
        warn!(error = %e, "Session did not close cleanly");
    }
    let summary = result?;

    println!("\n🎉 All records processed.");
    summary.print();
    Ok(())
}

fn cmd_login(config: &Config, token: &str, phone_number_id: &str) -> Result<()> {
    let path = Credentials::new(token, phone_number_id).save(&config.paths.session_dir)?;
    println!("{} Credentials saved to {}", "✓".green(), path.display());
    Ok(())
}

fn cmd_logout(config: &Config) -> Result<()> {
    if Credentials::remove(&config.paths.session_dir)? {
        println!("{} Credentials removed", "✓".green());
    } else {
        println!("No stored credentials");
    }
    Ok(())
}

fn cmd_profiles(config: &Config) -> Result<()> {
    for name in config.pacing.names() {
        let profile = config.pacing.resolve(&name)?;
        let marker = if name == config.pacing.profile { "*" } else { " " };
        println!(
            "{} {:<10} wait {:.1}-{:.1}s, typing {}x{:.0}s, presence {}, up to {:.0}s per record",
            marker.green(),
            name.cyan(),
            profile.delay_min_ms as f64 / 1000.0,
            profile.delay_max_ms as f64 / 1000.0,
            profile.typing_pulses,
            profile.typing_pulse().as_secs_f64(),
            if profile.presence { "on" } else { "off" },
            profile.max_total().as_secs_f64()
        );
    }
    Ok(())
}
