//! JSON file record store

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use log::{debug, info};

use crate::record::{Record, Status};

/// Errors from reading or writing the store file
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed store file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Flat, ordered list of records kept in a single JSON array file
///
/// The file is read whole and rewritten whole; there is no partial update.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read every record, in file order
    pub fn load(&self) -> Result<Vec<Record>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        let records: Vec<Record> = serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;

        debug!("Loaded {} records from {}", records.len(), self.path.display());
        Ok(records)
    }

    /// Overwrite the file with `records`
    ///
    /// Writes a sibling temp file, syncs it and renames it over the target, so
    /// a crash mid-write leaves the previous contents intact.
    pub fn save(&self, records: &[Record]) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut json = serde_json::to_string_pretty(records).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        json.push('\n');

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| StoreError::io(&dir, e))?;
        tmp.write_all(json.as_bytes()).map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.as_file().sync_all().map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.persist(&self.path).map_err(|e| StoreError::io(&self.path, e.error))?;

        debug!("Saved {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}

/// Per-status counts over a list of records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSummary {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
}

impl StoreSummary {
    pub fn count(&self, status: &Status) -> usize {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }
}

pub fn summarize(records: &[Record]) -> StoreSummary {
    let mut summary = StoreSummary {
        total: records.len(),
        ..Default::default()
    };
    for record in records {
        *summary.by_status.entry(record.status_text().to_string()).or_default() += 1;
    }
    summary
}

/// Which records `reset` puts back into the queue
#[derive(Debug, Clone)]
pub struct ResetFilter {
    /// Current statuses eligible for reset
    pub statuses: Vec<Status>,
    /// Restrict to records with this exact name
    pub name: Option<String>,
}

impl Default for ResetFilter {
    fn default() -> Self {
        Self {
            statuses: vec![Status::Failed],
            name: None,
        }
    }
}

impl ResetFilter {
    fn matches(&self, record: &Record) -> bool {
        let status_ok = record
            .status()
            .is_some_and(|s| !s.is_pending() && self.statuses.contains(&s));
        let name_ok = match &self.name {
            Some(name) => record.name() == Some(name.as_str()),
            None => true,
        };
        status_ok && name_ok
    }
}

/// Set matching records back to `PENDING`, returning how many changed
///
/// Only `status` is touched; `sent_at` and `error_msg` remain as history.
pub fn reset(records: &mut [Record], filter: &ResetFilter) -> usize {
    let mut changed = 0;
    for record in records.iter_mut().filter(|r| filter.matches(r)) {
        record.set_status(Status::Pending);
        changed += 1;
    }
    info!("Reset {} records to PENDING", changed);
    changed
}
