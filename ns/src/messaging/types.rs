//! Messaging request/response types

use std::fmt;
use std::path::Path;

use tracing::debug;

use super::MessagingError;

/// A resolved conversation on the messaging network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatHandle {
    /// Backend-specific chat identifier (e.g. the recipient's wa_id)
    pub id: String,
}

impl ChatHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for ChatHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Identifier the backend assigned to a delivered message
pub type MessageId = String;

/// Account presence as shown to contacts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Available,
    Unavailable,
}

/// Session lifecycle notifications emitted by a client while it initializes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The account is authenticated and ready to send
    Ready,
    /// The operator must complete a login step (e.g. scan this pairing code)
    AuthenticationRequired { code: String },
    /// The account was rejected; the run can't continue
    AuthenticationFailed(String),
}

/// An attachment loaded into memory
#[derive(Clone)]
pub struct Media {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl fmt::Debug for Media {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Media")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}

impl Media {
    /// Read a file and guess its MIME type from the extension
    pub async fn from_path(path: &Path) -> Result<Self, MessagingError> {
        debug!(path = %path.display(), "Media::from_path: called");
        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "attachment".to_string());
        Ok(Self {
            mime_type: mime_for(path).to_string(),
            filename,
            data,
        })
    }

    /// Whether the backend should present this as an image rather than a document
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}
