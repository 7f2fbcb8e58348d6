//! Messaging session lifecycle
//!
//! A [`Session`] owns the single messaging client for a run. Opening it
//! authenticates (or resumes from stored credentials); closing it disconnects.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use colored::*;
use qrcode::QrCode;
use qrcode::render::unicode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::messaging::{LifecycleEvent, MessagingClient, MessagingError};

const CREDENTIALS_FILE: &str = "credentials.json";

/// Errors that stop a run before any record is processed
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Authentication failure: {0}")]
    AuthenticationFailed(String),

    #[error("Messaging client closed before becoming ready")]
    Closed,

    #[error("Messaging client not ready after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Messaging(#[from] MessagingError),
}

/// Account credentials kept in the session directory between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub phone_number_id: String,
    pub saved_at: String,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, phone_number_id: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            phone_number_id: phone_number_id.into(),
            saved_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn path(session_dir: &Path) -> PathBuf {
        session_dir.join(CREDENTIALS_FILE)
    }

    /// Stored credentials, if any; unreadable files are logged and ignored
    pub fn load(session_dir: &Path) -> Option<Self> {
        let path = Self::path(session_dir);
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(creds) => {
                debug!(path = %path.display(), "Credentials::load: found stored credentials");
                Some(creds)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable credentials file");
                None
            }
        }
    }

    /// Write credentials, readable only by the owner on unix
    pub fn save(&self, session_dir: &Path) -> eyre::Result<PathBuf> {
        fs::create_dir_all(session_dir)?;
        let path = Self::path(session_dir);

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&path)?;
        file.write_all(serde_json::to_string_pretty(self)?.as_bytes())?;

        info!(path = %path.display(), "Saved credentials");
        Ok(path)
    }

    /// Remove stored credentials; returns whether a file was deleted
    pub fn remove(session_dir: &Path) -> eyre::Result<bool> {
        let path = Self::path(session_dir);
        if path.exists() {
            fs::remove_file(&path)?;
            info!(path = %path.display(), "Removed credentials");
            return Ok(true);
        }
        Ok(false)
    }
}

/// Terminal QR rendering of a pairing code, followed by the code as text
///
/// Codes too long for a QR symbol are shown as text only.
pub fn pairing_display(code: &str) -> String {
    match QrCode::new(code.as_bytes()) {
        Ok(qr) => {
            let image = qr
                .render::<unicode::Dense1x2>()
                .dark_color(unicode::Dense1x2::Light)
                .light_color(unicode::Dense1x2::Dark)
                .build();
            format!("{}\n{}", image, code.bold())
        }
        Err(e) => {
            warn!(error = %e, "Pairing code cannot be shown as QR");
            code.bold().to_string()
        }
    }
}

/// The one authenticated messaging session of a run
pub struct Session {
    client: Box<dyn MessagingClient>,
}

impl Session {
    /// Initialize `client` and wait until it reports `Ready`
    ///
    /// Pairing codes are printed for the operator while waiting. An
    /// authentication failure is fatal for the whole run.
    pub async fn open(mut client: Box<dyn MessagingClient>, auth_timeout: Duration) -> Result<Self, SessionError> {
        debug!(backend = client.name(), ?auth_timeout, "Session::open: called");
        let (tx, mut rx) = mpsc::channel(8);
        client.initialize(tx).await?;

        let deadline = tokio::time::Instant::now() + auth_timeout;
        loop {
            let event = match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Some(event)) => event,
                Ok(None) => return Err(SessionError::Closed),
                Err(_) => return Err(SessionError::Timeout(auth_timeout)),
            };
            match event {
                LifecycleEvent::Ready => {
                    info!(backend = client.name(), "Messaging client ready");
                    println!("{} Client is ready!", "✅".green());
                    return Ok(Self { client });
                }
                LifecycleEvent::AuthenticationRequired { code } => {
                    info!(backend = client.name(), "Authentication required");
                    println!("Scan this code with the messaging app on your phone:");
                    println!("{}", pairing_display(&code));
                }
                LifecycleEvent::AuthenticationFailed(reason) => {
                    warn!(backend = client.name(), %reason, "Authentication failed");
                    return Err(SessionError::AuthenticationFailed(reason));
                }
            }
        }
    }

    pub fn client(&self) -> &dyn MessagingClient {
        self.client.as_ref()
    }

    /// Disconnect gracefully
    pub async fn close(mut self) -> Result<(), SessionError> {
        debug!(backend = self.client.name(), "Session::close: called");
        self.client.disconnect().await?;
        Ok(())
    }
}
