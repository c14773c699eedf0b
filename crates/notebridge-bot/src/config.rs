//! Process configuration, loaded once at start-up and shared read-only.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use notebridge_core::defaults::{
    EXTRACT_TIMEOUT_SECS, MESSAGE_QUEUE_CAPACITY, SYNC_ENDPOINT, SYNC_TIMEOUT_SECS,
    TELEGRAM_API_URL, TELEGRAM_POLL_TIMEOUT_SECS,
};
use notebridge_core::{Error, Result};
use notebridge_extract::ExtractorConfig;
use notebridge_sync::SyncConfig;

pub const ENV_NOTES_ENDPOINT: &str = "STANDARDNOTES_ENDPOINT";
pub const ENV_NOTES_EMAIL: &str = "STANDARDNOTES_EMAIL";
pub const ENV_NOTES_PASSWORD: &str = "STANDARDNOTES_PASSWORD";
pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_OWNER_ID: &str = "TELEGRAM_OWNER_ID";
pub const ENV_TELEGRAM_API_URL: &str = "TELEGRAM_API_URL";
pub const ENV_POLL_TIMEOUT: &str = "TELEGRAM_POLL_TIMEOUT_SECS";
pub const ENV_REPLY_FORMAT: &str = "REPLY_FORMAT";
pub const ENV_EXTRACT_TIMEOUT: &str = "EXTRACT_TIMEOUT_SECS";
pub const ENV_SYNC_TIMEOUT: &str = "SYNC_TIMEOUT_SECS";
pub const ENV_QUEUE_CAPACITY: &str = "MESSAGE_QUEUE_CAPACITY";

/// Markup dialect of confirmation replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyFormat {
    #[default]
    Markdown,
    Html,
}

impl ReplyFormat {
    /// Value of the Bot API `parse_mode` parameter.
    pub fn parse_mode(&self) -> &'static str {
        match self {
            ReplyFormat::Markdown => "Markdown",
            ReplyFormat::Html => "HTML",
        }
    }
}

impl FromStr for ReplyFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(ReplyFormat::Markdown),
            "html" => Ok(ReplyFormat::Html),
            other => Err(Error::Config(format!(
                "{} must be markdown or html, got {:?}",
                ENV_REPLY_FORMAT, other
            ))),
        }
    }
}

/// Everything the bridge needs to run.
///
/// Built once, then passed by `Arc` into the orchestrator and gateway.
#[derive(Clone)]
pub struct AppConfig {
    pub notes_endpoint: String,
    pub notes_email: String,
    pub notes_password: String,
    pub bot_token: String,
    /// Authorized sender ids. Empty accepts every sender.
    pub owner_ids: Vec<i64>,
    pub telegram_api_url: String,
    pub poll_timeout: Duration,
    pub reply_format: ReplyFormat,
    pub extract_timeout: Duration,
    pub sync_timeout: Duration,
    pub queue_capacity: usize,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration from a `.env`-style file, ignoring the process
    /// environment.
    pub fn from_dotenv_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let iter = dotenvy::from_path_iter(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;

        let mut vars = HashMap::new();
        for entry in iter {
            let (key, value) = entry
                .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;
            vars.insert(key, value);
        }
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &str| {
            get(key).ok_or_else(|| Error::Config(format!("{} is required", key)))
        };
        let secs = |key: &str, default: u64| -> Result<Duration> {
            match get(key) {
                Some(raw) => raw.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                    Error::Config(format!("{} must be a number of seconds, got {:?}", key, raw))
                }),
                None => Ok(Duration::from_secs(default)),
            }
        };

        let queue_capacity = match get(ENV_QUEUE_CAPACITY) {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(Error::Config(format!(
                        "{} must be a positive integer, got {:?}",
                        ENV_QUEUE_CAPACITY, raw
                    )))
                }
            },
            None => MESSAGE_QUEUE_CAPACITY,
        };

        Ok(Self {
            notes_endpoint: get(ENV_NOTES_ENDPOINT).unwrap_or_else(|| SYNC_ENDPOINT.to_string()),
            notes_email: required(ENV_NOTES_EMAIL)?,
            notes_password: required(ENV_NOTES_PASSWORD)?,
            bot_token: required(ENV_BOT_TOKEN)?,
            owner_ids: match get(ENV_OWNER_ID) {
                Some(raw) => parse_owner_ids(&raw)?,
                None => Vec::new(),
            },
            telegram_api_url: get(ENV_TELEGRAM_API_URL)
                .unwrap_or_else(|| TELEGRAM_API_URL.to_string()),
            poll_timeout: secs(ENV_POLL_TIMEOUT, TELEGRAM_POLL_TIMEOUT_SECS)?,
            reply_format: match get(ENV_REPLY_FORMAT) {
                Some(raw) => raw.parse()?,
                None => ReplyFormat::default(),
            },
            extract_timeout: secs(ENV_EXTRACT_TIMEOUT, EXTRACT_TIMEOUT_SECS)?,
            sync_timeout: secs(ENV_SYNC_TIMEOUT, SYNC_TIMEOUT_SECS)?,
            queue_capacity,
        })
    }

    /// Whether messages from `sender` should be processed.
    pub fn is_authorized(&self, sender: Option<i64>) -> bool {
        if self.owner_ids.is_empty() {
            return true;
        }
        sender.is_some_and(|id| self.owner_ids.contains(&id))
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            endpoint: self.notes_endpoint.clone(),
            timeout: self.sync_timeout,
            ..SyncConfig::default()
        }
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            timeout: self.extract_timeout,
            ..ExtractorConfig::default()
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("notes_endpoint", &self.notes_endpoint)
            .field("notes_email", &self.notes_email)
            .field("notes_password", &"[REDACTED]")
            .field("bot_token", &"[REDACTED]")
            .field("owner_ids", &self.owner_ids)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("poll_timeout", &self.poll_timeout)
            .field("reply_format", &self.reply_format)
            .field("extract_timeout", &self.extract_timeout)
            .field("sync_timeout", &self.sync_timeout)
            .field("queue_capacity", &self.queue_capacity)
            .finish()
    }
}

fn parse_owner_ids(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>().map_err(|_| {
                Error::Config(format!("{} contains a non-numeric id: {:?}", ENV_OWNER_ID, s))
            })
        })
        .collect()
}
