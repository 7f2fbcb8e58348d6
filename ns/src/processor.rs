//! Record processor: validate, pace and send one record
//!
//! Every failure past this point is record-local. `process` never returns an
//! error; it settles the record as `SENT` or `FAILED` and writes the reason
//! into the record.

use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use queuestore::{Record, Status};
use thiserror::Error;
use tracing::{debug, warn};

use crate::messaging::{Media, MessageId, MessagingClient, MessagingError, Presence};
use crate::pacing::PacingProfile;
use crate::report::{self, Mark};

/// Why a record could not be delivered
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Phone or country code missing")]
    MissingContact,

    #[error("Number {0} not registered with the messaging network")]
    NotRegistered(String),

    #[error("Attachment missing or invalid name: {0}")]
    BadAttachmentName(String),

    #[error("Cannot read attachment {}: {source}", path.display())]
    Attachment {
        path: PathBuf,
        #[source]
        source: MessagingError,
    },

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error(transparent)]
    Messaging(#[from] MessagingError),
}

/// Resolve a record's `filename` inside the attachment directory
///
/// Only plain relative names are accepted; anything that would escape the
/// directory yields `None`.
pub fn attachment_path(dir: &Path, filename: Option<&str>) -> Option<PathBuf> {
    let filename = filename.filter(|f| !f.is_empty())?;
    let relative = Path::new(filename);
    if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(dir.join(relative))
}

/// Sends one record at a time through a messaging client
#[derive(Debug, Clone)]
pub struct RecordProcessor {
    pacing: PacingProfile,
    attachment_dir: PathBuf,
    request_timeout: Duration,
}

impl RecordProcessor {
    pub fn new(pacing: PacingProfile, attachment_dir: impl Into<PathBuf>, request_timeout: Duration) -> Self {
        Self {
            pacing,
            attachment_dir: attachment_dir.into(),
            request_timeout,
        }
    }

    pub fn attachment_dir(&self) -> &Path {
        &self.attachment_dir
    }

    /// Try to deliver `record`, settling it as `SENT` or `FAILED`
    ///
    /// On success `sent_at` is set; on failure `error_msg` holds the full
    /// reason. No retries happen here.
    pub async fn process(&self, record: &mut Record, client: &dyn MessagingClient) -> Status {
        let label = record.label();
        match self.deliver(record, client, &label).await {
            Ok(msg_id) => {
                debug!(%label, %msg_id, "process: delivered");
                record.mark_sent(Utc::now());
                report::step(&label, Mark::Sent, "Sent successfully.");
                Status::Sent
            }
            Err(e) => {
                report::step(&label, Mark::Error, format_args!("Failed ({})", e));
                record.mark_failed(e.to_string());
                self.signal_presence(client, Presence::Unavailable).await;
                Status::Failed
            }
        }
    }

    async fn deliver(&self, record: &Record, client: &dyn MessagingClient, label: &str) -> Result<MessageId, ProcessError> {
        self.signal_presence(client, Presence::Available).await;

        report::step(label, Mark::Validating, "Validating number...");
        let number = record.canonical_number().ok_or(ProcessError::MissingContact)?;
        let chat = self
            .bounded("Number lookup", client.resolve(&number))
            .await?
            .ok_or_else(|| ProcessError::NotRegistered(number.clone()))?;
        debug!(%label, %chat, "deliver: resolved");

        let delay = self.pacing.pre_send_delay();
        report::step(label, Mark::Waiting, format_args!("Waiting {:.1}s...", delay.as_secs_f64()));
        tokio::time::sleep(delay).await;

        if self.pacing.typing_pulses > 0 {
            let total = self.pacing.typing_pulse() * self.pacing.typing_pulses;
            report::step(label, Mark::Waiting, format_args!("Typing for {:.0}s...", total.as_secs_f64()));
            for _ in 0..self.pacing.typing_pulses {
                if let Err(e) = client.send_typing(&chat).await {
                    warn!(%label, error = %e, "Typing indicator failed");
                }
                tokio::time::sleep(self.pacing.typing_pulse()).await;
            }
        }

        report::step(label, Mark::Sending, "Sending...");
        let filename = record.filename().unwrap_or_default();
        let path = attachment_path(&self.attachment_dir, record.filename())
            .ok_or_else(|| ProcessError::BadAttachmentName(filename.to_string()))?;
        let loaded = Media::from_path(&path).await;
        let media = loaded.map_err(|source| ProcessError::Attachment { path, source })?;

        let caption = record.message().unwrap_or_default();
        self.bounded("Send", client.send_media(&chat, media, caption)).await
    }

    /// Run a client call under the request timeout
    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, MessagingError>>,
    ) -> Result<T, ProcessError> {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ProcessError::Timeout {
                operation,
                timeout: self.request_timeout,
            }),
        }
    }

    /// Best-effort presence update; failures are logged only
    async fn signal_presence(&self, client: &dyn MessagingClient, presence: Presence) {
        if !self.pacing.presence {
            return;
        }
        if let Err(e) = client.set_presence(presence).await {
            warn!(?presence, error = %e, "Presence update failed");
        }
    }
}
