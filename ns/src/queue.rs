//! Queue orchestration
//!
//! Walks the record store in order, decides what to do with each record and
//! persists the store after every record it settles. Records are never
//! processed concurrently: one session, one record in flight.

use std::path::Path;

use colored::*;
use eyre::{Context, Result};
use queuestore::{Record, RecordStore, Status, StoreError};
use tracing::{debug, info, warn};

use crate::messaging::MessagingClient;
use crate::processor::{RecordProcessor, attachment_path};
use crate::report::{self, Mark};

/// What the runner does with one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Not `PENDING`; left exactly as it is
    Settled,
    /// `send_receipt` is explicitly false
    SkipNoReceipt,
    /// Phone or country code missing
    PhoneMissing,
    /// Attachment not found on disk
    FileMissing,
    /// Hand to the processor
    Send,
}

/// Decide a record's fate; checks apply in this order
pub fn triage(record: &Record, attachment_dir: &Path) -> Disposition {
    if !record.is_pending() {
        return Disposition::Settled;
    }
    if record.receipt_declined() {
        return Disposition::SkipNoReceipt;
    }
    if !record.has_contact() {
        return Disposition::PhoneMissing;
    }
    match attachment_path(attachment_dir, record.filename()) {
        Some(path) if path.is_file() => Disposition::Send,
        _ => Disposition::FileMissing,
    }
}

/// Outcome counts for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub loaded: usize,
    pub already_settled: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped_no_receipt: usize,
    pub phone_missing: usize,
    pub file_missing: usize,
}

impl RunSummary {
    fn count(&mut self, status: &Status) {
        match status {
            Status::Sent => self.sent += 1,
            Status::Failed => self.failed += 1,
            Status::SkippedNoReceipt => self.skipped_no_receipt += 1,
            Status::ErrorPhoneMissing => self.phone_missing += 1,
            Status::ErrorFileMissing => self.file_missing += 1,
            Status::Pending | Status::Other(_) => {}
        }
    }

    /// Records this run changed
    pub fn settled(&self) -> usize {
        self.sent + self.failed + self.skipped_no_receipt + self.phone_missing + self.file_missing
    }

    pub fn print(&self) {
        println!();
        println!("{}", "Summary".bold());
        println!("  Loaded:             {}", self.loaded);
        println!("  Already settled:    {}", self.already_settled.to_string().dimmed());
        println!("  Sent:               {}", self.sent.to_string().green());
        println!("  Failed:             {}", self.failed.to_string().red());
        println!("  Skipped (receipt):  {}", self.skipped_no_receipt.to_string().yellow());
        println!("  Phone missing:      {}", self.phone_missing.to_string().red());
        println!("  File missing:       {}", self.file_missing.to_string().red());
    }
}

/// Drives the record store through a messaging client
pub struct QueueRunner {
    store: RecordStore,
    processor: RecordProcessor,
    persist: bool,
}

impl QueueRunner {
    pub fn new(store: RecordStore, processor: RecordProcessor) -> Self {
        Self {
            store,
            processor,
            persist: true,
        }
    }

    /// Work on the loaded records in memory only; the store file is never written
    pub fn read_only(mut self) -> Self {
        self.persist = false;
        self
    }

    /// Process every record once, in store order
    ///
    /// A missing store file means there is nothing to do. Per-record failures
    /// are written into the records; only store I/O errors abort the run. A
    /// read-only runner reports the outcomes without saving them.
    pub async fn run(&self, client: &dyn MessagingClient) -> Result<RunSummary> {
        let mut records = match self.store.load() {
            Ok(records) => records,
            Err(StoreError::NotFound(path)) => {
                warn!(path = %path.display(), "Data file missing, nothing to do");
                eprintln!("{} Data file missing: {}", "❌".red(), path.display());
                return Ok(RunSummary::default());
            }
            Err(e) => return Err(e).context("Failed to load record store"),
        };

        let mut summary = RunSummary {
            loaded: records.len(),
            ..Default::default()
        };
        println!("📂 Loaded {} records.\n", records.len());
        if !self.persist {
            println!("{} Dry run: outcomes are shown but not saved.\n", "🧪".yellow());
        }
        info!(count = records.len(), store = %self.store.path().display(), persist = self.persist, "Queue loaded");

        for idx in 0..records.len() {
            let label = records[idx].label();
            report::separator();
            report::step(&label, Mark::Processing, "Processing...");

            let disposition = triage(&records[idx], self.processor.attachment_dir());
            debug!(idx, %label, ?disposition, "run: triaged");

            let status = match disposition {
                Disposition::Settled => {
                    report::step(
                        &label,
                        Mark::Skipped,
                        format_args!("Skipping (Status: {})", records[idx].status_text()),
                    );
                    summary.already_settled += 1;
                    continue;
                }
                Disposition::SkipNoReceipt => {
                    report::step(&label, Mark::Skipped, "Skipping (Receipt not required)");
                    Status::SkippedNoReceipt
                }
                Disposition::PhoneMissing => {
                    report::step(&label, Mark::Error, "Error (Phone/Country Code missing)");
                    Status::ErrorPhoneMissing
                }
                Disposition::FileMissing => {
                    let filename = records[idx].filename().unwrap_or("<none>");
                    report::step(&label, Mark::Error, format_args!("Error (PDF file missing: {})", filename));
                    Status::ErrorFileMissing
                }
                Disposition::Send => self.processor.process(&mut records[idx], client).await,
            };

            summary.count(&status);
            records[idx].set_status(status);
            if self.persist {
                self.store
                    .save(&records)
                    .context(format!("Failed to persist progress after record {}", label))?;
            } else {
                debug!(idx, %label, "run: read-only, not saving");
            }
        }

        info!(?summary, "Queue finished");
        Ok(summary)
    }
}
