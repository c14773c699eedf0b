//! Minimal Bot API client: long-poll updates and send messages.

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use notebridge_core::{Error, Result};

use crate::config::AppConfig;
use crate::message::Update;

/// Added to the long-poll timeout for the HTTP request bound.
const POLL_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    offset: i64,
    timeout: u64,
    allowed_updates: &'static [&'static str],
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

/// Bot API client bound to one bot token.
pub struct TelegramClient {
    client: Client,
    /// `{api_url}/bot{token}`; contains the token, never log it.
    base_url: String,
    poll_timeout: Duration,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str, poll_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(poll_timeout + POLL_GRACE)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
            poll_timeout,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            &config.telegram_api_url,
            &config.bot_token,
            config.poll_timeout,
        )
    }

    /// Long-poll for updates with id `>= offset`.
    #[instrument(
        skip(self),
        fields(subsystem = "bot", component = "telegram", op = "get_updates")
    )]
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: self.poll_timeout.as_secs(),
            allowed_updates: &["message"],
        };
        let updates: Vec<Update> = self.call("getUpdates", &request).await?;
        if !updates.is_empty() {
            debug!(count = updates.len(), "Received updates");
        }
        Ok(updates)
    }

    /// Send `text` to `chat_id`, with markup when `parse_mode` is set.
    #[instrument(
        skip(self, text),
        fields(subsystem = "bot", component = "telegram", op = "send_message")
    )]
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<&str>,
    ) -> Result<()> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode,
        };
        let _sent: serde_json::Value = self.call("sendMessage", &request).await?;
        Ok(())
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(method, e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(method, e))?;

        let parsed: ApiResponse<T> = serde_json::from_slice(&bytes).map_err(|e| {
            if status.is_success() {
                Error::Serialization(format!("{}: {}", method, e))
            } else {
                Error::Request(format!("{}: HTTP {}", method, status))
            }
        })?;

        if !parsed.ok {
            let description = parsed
                .description
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(Error::Request(format!("{}: {}", method, description)));
        }
        parsed
            .result
            .ok_or_else(|| Error::Serialization(format!("{}: response has no result", method)))
    }
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &"[REDACTED]")
            .field("poll_timeout", &self.poll_timeout)
            .finish()
    }
}

/// Request URLs carry the bot token, so it is stripped from the error.
fn transport_error(method: &str, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Request(format!("{}: timed out", method))
    } else {
        Error::Request(format!("{}: {}", method, e.without_url()))
    }
}
