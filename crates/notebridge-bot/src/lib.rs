//! # notebridge-bot
//!
//! Telegram front end of notebridge.
//!
//! This crate provides:
//! - [`AppConfig`], read once from the environment or a `.env` file
//! - Bot API message parsing: links, UTF-16 hashtag spans, forward labels
//! - [`MessageOrchestrator`], which files one message as one encrypted note
//! - [`ChatGateway`], which polls the Bot API and relays replies
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use notebridge_bot::{AppConfig, ChatGateway, MessageOrchestrator, TelegramClient};
//! use notebridge_extract::ArticleExtractor;
//!
//! let config = Arc::new(AppConfig::from_env()?);
//! let extractor = Arc::new(ArticleExtractor::new(config.extractor_config())?);
//! let orchestrator = Arc::new(MessageOrchestrator::new(config.clone(), extractor));
//!
//! let handle = ChatGateway::new(TelegramClient::from_config(&config)?, orchestrator, config)
//!     .start();
//! let mut events = handle.events();
//! while let Ok(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! ```

pub mod config;
pub mod gateway;
pub mod message;
pub mod orchestrator;
pub mod reply;
pub mod telegram;

// Re-export commonly used types
pub use config::{AppConfig, ReplyFormat};
pub use gateway::{ChatGateway, GatewayEvent, GatewayHandle, MessageHandler};
pub use message::{Chat, Message, MessageEntity, Update, User};
pub use orchestrator::{MessageOrchestrator, NoteDraft};
pub use telegram::TelegramClient;
