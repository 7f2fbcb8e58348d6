//! NotifySender - sequential invoice notification sender
//!
//! Reads the invoice notification queue written by the producer, sends each
//! pending record's attachment and caption through one messaging account, and
//! writes every outcome back into the queue file.
//!
//! # Core Concepts
//!
//! - **Status is the truth**: only `PENDING` records are attempted; anything
//!   else is left byte-for-byte alone, so rerunning the batch is the retry
//! - **Persist per record**: the store is rewritten after every settled record
//! - **One session, one record**: sends are strictly sequential and paced
//! - **Transport is a capability**: the messaging account sits behind a trait
//!
//! # Modules
//!
//! - [`messaging`] - MessagingClient trait, Cloud API and dry-run backends
//! - [`session`] - Session lifecycle and stored credentials
//! - [`pacing`] - Pacing profiles
//! - [`processor`] - Single-record delivery
//! - [`queue`] - Queue orchestration
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod messaging;
pub mod pacing;
pub mod processor;
pub mod queue;
pub mod report;
pub mod session;

// Re-export commonly used types
pub use config::{Config, MessagingConfig, PacingConfig, PathsConfig};
pub use messaging::{
    ChatHandle, CloudApiClient, DryRunClient, LifecycleEvent, Media, MessageId, MessagingClient, MessagingError,
    Presence, create_client,
};
pub use pacing::PacingProfile;
pub use processor::{ProcessError, RecordProcessor, attachment_path};
pub use queue::{Disposition, QueueRunner, RunSummary, triage};
pub use session::{Credentials, Session, SessionError};
