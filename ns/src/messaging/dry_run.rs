//! Dry-run client: goes through the whole queue without sending anything

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use super::{ChatHandle, LifecycleEvent, Media, MessageId, MessagingClient, MessagingError};

#[derive(Debug, Default)]
pub struct DryRunClient;

impl DryRunClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MessagingClient for DryRunClient {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn initialize(&mut self, events: mpsc::Sender<LifecycleEvent>) -> Result<(), MessagingError> {
        let _ = events.send(LifecycleEvent::Ready).await;
        Ok(())
    }

    async fn resolve(&self, number: &str) -> Result<Option<ChatHandle>, MessagingError> {
        let valid = !number.is_empty() && number.chars().all(|c| c.is_ascii_digit());
        Ok(valid.then(|| ChatHandle::new(number)))
    }

    async fn send_media(&self, chat: &ChatHandle, media: Media, caption: &str) -> Result<MessageId, MessagingError> {
        info!(to = %chat, filename = %media.filename, bytes = media.data.len(), caption_len = caption.len(), "Dry run: would send");
        Ok(format!("dry-run-{}", Uuid::now_v7()))
    }

    async fn disconnect(&mut self) -> Result<(), MessagingError> {
        Ok(())
    }
}
