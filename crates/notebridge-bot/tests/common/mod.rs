//! Shared fixtures for the bot integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use notebridge_bot::{AppConfig, Chat, Message, MessageEntity, User};
use notebridge_core::{Article, ArticleSource, Error, ExtractionError, PageMeta, Result};

pub const EMAIL: &str = "owner@example.com";
pub const PASSWORD: &str = "correct horse battery staple";
pub const BOT_TOKEN: &str = "123456:TEST-token";
pub const OWNER_ID: i64 = 42;

/// App config from `vars` layered over a minimal valid set.
pub fn app_config(vars: &[(&str, &str)]) -> Arc<AppConfig> {
    let mut map: HashMap<String, String> = [
        ("STANDARDNOTES_EMAIL", EMAIL),
        ("STANDARDNOTES_PASSWORD", PASSWORD),
        ("TELEGRAM_BOT_TOKEN", BOT_TOKEN),
        ("TELEGRAM_POLL_TIMEOUT_SECS", "1"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in vars {
        map.insert(k.to_string(), v.to_string());
    }
    Arc::new(AppConfig::from_lookup(|key| map.get(key).cloned()).expect("valid test config"))
}

/// Private-chat text message from the owner.
pub fn owner_message(text: &str, entities: Vec<MessageEntity>) -> Message {
    Message {
        message_id: 1,
        from: Some(User {
            id: OWNER_ID,
            username: None,
        }),
        chat: Chat {
            id: OWNER_ID,
            title: None,
        },
        text: Some(text.to_string()),
        entities,
        ..Default::default()
    }
}

/// Article source answering every URL with the same result.
pub struct StubArticles {
    result: std::result::Result<Article, ExtractionError>,
    calls: Mutex<Vec<String>>,
}

impl StubArticles {
    pub fn returning(title: &str, markdown: &str) -> Self {
        Self {
            result: Ok(Article {
                markdown: markdown.to_string(),
                meta: PageMeta {
                    title: title.to_string(),
                    length: markdown.len(),
                    ..Default::default()
                },
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ExtractionError) -> Self {
        Self {
            result: Err(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArticleSource for StubArticles {
    async fn extract(&self, url: &str) -> Result<Article> {
        self.calls.lock().unwrap().push(url.to_string());
        self.result.clone().map_err(Error::from)
    }
}
