//! MessagingClient trait definition

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ChatHandle, LifecycleEvent, Media, MessageId, MessagingError, Presence};

/// One authenticated messaging account
///
/// The transport itself (account pairing, number lookup, media delivery) lives
/// behind this trait. The sender drives exactly one client at a time and never
/// issues two calls concurrently.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Start connecting; progress is reported on `events`
    ///
    /// Implementations may return before `Ready` is sent (e.g. while waiting
    /// for the operator to pair the account) as long as they keep the sender
    /// alive until a terminal event has been delivered.
    async fn initialize(&mut self, events: mpsc::Sender<LifecycleEvent>) -> Result<(), MessagingError>;

    /// Look up a dial string; `None` if it has no account on the network
    async fn resolve(&self, number: &str) -> Result<Option<ChatHandle>, MessagingError>;

    /// Deliver an attachment with a caption
    async fn send_media(&self, chat: &ChatHandle, media: Media, caption: &str) -> Result<MessageId, MessagingError>;

    /// Advertise presence; backends without presence treat this as a no-op
    async fn set_presence(&self, _presence: Presence) -> Result<(), MessagingError> {
        Ok(())
    }

    /// Show a typing indicator in `chat`; no-op unless the backend supports it
    async fn send_typing(&self, _chat: &ChatHandle) -> Result<(), MessagingError> {
        Ok(())
    }

    /// Close the connection
    async fn disconnect(&mut self) -> Result<(), MessagingError>;
}
