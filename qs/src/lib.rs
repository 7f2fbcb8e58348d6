//! QueueStore - record store for the invoice notification queue
//!
//! The queue is a single JSON array shared between the producer (which writes
//! `PENDING` records) and the sender (which settles them one at a time).
//!
//! # Layout
//!
//! ```text
//! shared-data/
//! ├── output.json      # the record array
//! └── pdfs/
//!     ├── 0042-Ana-05-2025.pdf
//!     └── ...
//! ```
//!
//! # Example
//!
//! ```ignore
//! use queuestore::{RecordStore, Status};
//!
//! let store = RecordStore::new("shared-data/output.json");
//! let mut records = store.load()?;
//! records[0].set_status(Status::Sent);
//! store.save(&records)?;
//! ```

pub mod cli;
pub mod config;
mod record;
mod store;

pub use record::{Record, Status, canonical_number};
pub use store::{RecordStore, ResetFilter, StoreError, StoreSummary, reset, summarize};

/// Default location of the record file, relative to the working directory
pub const DEFAULT_STORE_PATH: &str = "shared-data/output.json";
