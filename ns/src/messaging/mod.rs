//! Messaging module for NotifySender
//!
//! The messaging account is a capability behind [`MessagingClient`]; the queue
//! never talks to a transport directly.

use tracing::debug;

pub mod client;
mod cloud;
mod dry_run;
mod error;
mod types;

pub use client::MessagingClient;
#[cfg(test)]
pub use client::mock;
pub use cloud::CloudApiClient;
pub use dry_run::DryRunClient;
pub use error::MessagingError;
pub use types::{ChatHandle, LifecycleEvent, Media, MessageId, Presence};

use crate::config::MessagingConfig;
use crate::session::Credentials;

/// Create a messaging client for the backend named in config
///
/// Supports "cloud-api" and "dry-run".
pub fn create_client(
    config: &MessagingConfig,
    credentials: Option<&Credentials>,
) -> Result<Box<dyn MessagingClient>, MessagingError> {
    debug!(backend = %config.backend, "create_client: called");
    match config.backend.as_str() {
        "cloud-api" => Ok(Box::new(CloudApiClient::from_config(config, credentials)?)),
        "dry-run" => Ok(Box::new(DryRunClient::new())),
        other => Err(MessagingError::UnsupportedBackend(other.to_string())),
    }
}
