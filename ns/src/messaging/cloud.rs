//! WhatsApp Business Cloud API client
//!
//! Sends through the Graph API using an access token and a sending phone
//! number id. The Cloud API has no presence or typing endpoints, so those
//! signals fall back to the trait's no-op defaults.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{ChatHandle, LifecycleEvent, Media, MessageId, MessagingClient, MessagingError};
use crate::config::MessagingConfig;
use crate::session::Credentials;

/// Shortest and longest E.164 subscriber numbers, country code included
const MIN_DIGITS: usize = 8;
const MAX_DIGITS: usize = 15;

/// WhatsApp Business Cloud API client
pub struct CloudApiClient {
    base_url: String,
    api_version: String,
    phone_number_id: String,
    access_token: String,
    http: Client,
    connected: bool,
}

impl CloudApiClient {
    /// Build from config, falling back to stored credentials
    ///
    /// The token comes from the configured environment variable first, then
    /// from the session directory. A missing token isn't an error here; it
    /// surfaces as an authentication failure when the session opens.
    pub fn from_config(config: &MessagingConfig, credentials: Option<&Credentials>) -> Result<Self, MessagingError> {
        debug!(base_url = %config.base_url, "CloudApiClient::from_config: called");
        let access_token = std::env::var(&config.access_token_env)
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| credentials.map(|c| c.access_token.clone()))
            .unwrap_or_default();
        let phone_number_id = config
            .phone_number_id
            .clone()
            .or_else(|| credentials.map(|c| c.phone_number_id.clone()))
            .unwrap_or_default();

        let http = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            phone_number_id,
            access_token,
            http,
            connected: false,
        })
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/{}/{}{}", self.base_url, self.api_version, self.phone_number_id, suffix)
    }

    fn ensure_connected(&self) -> Result<(), MessagingError> {
        if self.connected {
            Ok(())
        } else {
            Err(MessagingError::NotConnected)
        }
    }

    /// Turn a non-2xx response into an API error carrying the body
    async fn check(response: reqwest::Response) -> Result<serde_json::Value, MessagingError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or(body);
            return Err(MessagingError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    /// Upload media and return its media id
    async fn upload(&self, media: Media) -> Result<String, MessagingError> {
        debug!(filename = %media.filename, len = media.data.len(), "upload: called");
        let part = Part::bytes(media.data)
            .file_name(media.filename)
            .mime_str(&media.mime_type)?;
        let form = Form::new()
            .text("messaging_product", "whatsapp")
            .text("type", media.mime_type)
            .part("file", part);

        let response = self
            .http
            .post(self.url("/media"))
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await?;
        let body = Self::check(response).await?;

        body["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| MessagingError::InvalidResponse(format!("media upload returned no id: {}", body)))
    }
}

#[async_trait]
impl MessagingClient for CloudApiClient {
    fn name(&self) -> &str {
        "cloud-api"
    }

    async fn initialize(&mut self, events: mpsc::Sender<LifecycleEvent>) -> Result<(), MessagingError> {
        if self.access_token.is_empty() || self.phone_number_id.is_empty() {
            let _ = events
                .send(LifecycleEvent::AuthenticationFailed(
                    "no access token or phone number id; run `ns login` or set them in config".to_string(),
                ))
                .await;
            return Ok(());
        }

        // Verify the token against the sending number
        let response = self
            .http
            .get(self.url(""))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let event = match Self::check(response).await {
            Ok(_) => {
                self.connected = true;
                info!(phone_number_id = %self.phone_number_id, "Cloud API: connected");
                LifecycleEvent::Ready
            }
            Err(e) if e.is_auth() => LifecycleEvent::AuthenticationFailed(e.to_string()),
            Err(e) => return Err(e),
        };
        let _ = events.send(event).await;
        Ok(())
    }

    /// The Cloud API has no contact lookup; a well-formed E.164 number is
    /// addressable and delivery errors surface from `send_media`
    async fn resolve(&self, number: &str) -> Result<Option<ChatHandle>, MessagingError> {
        self.ensure_connected()?;
        let valid = (MIN_DIGITS..=MAX_DIGITS).contains(&number.len()) && number.chars().all(|c| c.is_ascii_digit());
        debug!(number, valid, "resolve: checked");
        Ok(valid.then(|| ChatHandle::new(number)))
    }

    async fn send_media(&self, chat: &ChatHandle, media: Media, caption: &str) -> Result<MessageId, MessagingError> {
        self.ensure_connected()?;
        let kind = if media.is_image() { "image" } else { "document" };
        let filename = media.filename.clone();
        let media_id = self.upload(media).await?;

        let mut payload = serde_json::json!({
            "id": media_id,
            "caption": caption,
        });
        if kind == "document" {
            payload["filename"] = serde_json::Value::String(filename);
        }

        let mut body = serde_json::json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": chat.id,
            "type": kind,
        });
        body[kind] = payload;

        let response = self
            .http
            .post(self.url("/messages"))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        let result = Self::check(response).await?;

        let msg_id = result["messages"][0]["id"].as_str().unwrap_or("unknown").to_string();
        debug!(%msg_id, to = %chat.id, "Cloud API: message sent");
        Ok(msg_id)
    }

    async fn disconnect(&mut self) -> Result<(), MessagingError> {
        self.connected = false;
        info!("Cloud API: disconnected");
        Ok(())
    }
}
