//! Messaging error types

use thiserror::Error;

/// Errors raised by a messaging backend
#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unknown messaging backend: '{0}'. Supported: cloud-api, dry-run")]
    UnsupportedBackend(String),

    #[error("Client is not connected")]
    NotConnected,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MessagingError {
    /// Check if the error means the account credentials were rejected
    pub fn is_auth(&self) -> bool {
        match self {
            MessagingError::Auth(_) => true,
            MessagingError::Api { status, .. } => matches!(status, 401 | 403),
            _ => false,
        }
    }
}
