//! NotifySender configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::pacing::PacingProfile;

/// Main NotifySender configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the queue, attachments and session material live
    pub paths: PathsConfig,

    /// Messaging backend configuration
    pub messaging: MessagingConfig,

    /// Send pacing
    pub pacing: PacingConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .notifysender.yml
        let local_config = PathBuf::from(".notifysender.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/notifysender/notifysender.yml
        if let Some(user_config) = user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed here; `load` reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => [Some(PathBuf::from(".notifysender.yml")), user_config_path()]
                .into_iter()
                .flatten()
                .collect(),
        };
        candidates
            .iter()
            .find(|p| p.exists())
            .and_then(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("notifysender").join("notifysender.yml"))
}

/// Filesystem locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// JSON record file shared with the producer
    #[serde(rename = "store-path")]
    pub store_path: PathBuf,

    /// Directory holding the attachments named by each record's `filename`
    #[serde(rename = "attachment-dir")]
    pub attachment_dir: PathBuf,

    /// Directory where the messaging account's session material is kept
    #[serde(rename = "session-dir")]
    pub session_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(queuestore::DEFAULT_STORE_PATH),
            attachment_dir: PathBuf::from("shared-data/pdfs"),
            session_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("notifysender")
                .join("sessions"),
        }
    }
}

/// Messaging backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    /// Backend name ("cloud-api" or "dry-run")
    pub backend: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Graph API version segment
    #[serde(rename = "api-version")]
    pub api_version: String,

    /// Sending phone number id; falls back to stored credentials
    #[serde(rename = "phone-number-id")]
    pub phone_number_id: Option<String>,

    /// Environment variable containing the access token
    #[serde(rename = "access-token-env")]
    pub access_token_env: String,

    /// Per-request timeout in milliseconds
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,

    /// How long to wait for the account to become ready
    #[serde(rename = "auth-timeout-ms")]
    pub auth_timeout_ms: u64,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            backend: "cloud-api".to_string(),
            base_url: "https://graph.facebook.com".to_string(),
            api_version: "v21.0".to_string(),
            phone_number_id: None,
            access_token_env: "WHATSAPP_ACCESS_TOKEN".to_string(),
            request_timeout_ms: 60_000,
            auth_timeout_ms: 300_000,
        }
    }
}

/// Pacing profile selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Name of the active profile
    pub profile: String,

    /// Extra or overriding profiles by name
    pub profiles: BTreeMap<String, PacingProfile>,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            profile: "cautious".to_string(),
            profiles: BTreeMap::new(),
        }
    }
}

impl PacingConfig {
    /// Look up a profile by name, configured profiles first
    pub fn resolve(&self, name: &str) -> Result<PacingProfile> {
        let profile = self
            .profiles
            .get(name)
            .cloned()
            .or_else(|| PacingProfile::builtin(name))
            .ok_or_else(|| eyre::eyre!("Unknown pacing profile '{}'. Available: {}", name, self.names().join(", ")))?;
        profile.validate().context(format!("Invalid pacing profile '{}'", name))?;
        Ok(profile)
    }

    /// The active profile
    pub fn active(&self) -> Result<PacingProfile> {
        self.resolve(&self.profile)
    }

    /// Every profile name, built-ins included
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = PacingProfile::BUILTIN_NAMES.iter().map(|s| s.to_string()).collect();
        for name in self.profiles.keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }
}
