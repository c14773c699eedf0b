//! Turns one chat message into one note.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use notebridge_core::defaults::{BASE_TAGS, HASHTAG_TAG_PREFIX, LINKS_TAG};
use notebridge_core::{Article, ArticleSource, Result};
use notebridge_sync::{NoteStore, SyncConfig};

use crate::config::AppConfig;
use crate::message::Message;
use crate::reply;

/// Note contents derived from a message, before any link is expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub text: String,
    pub tags: Vec<String>,
    pub links: Vec<String>,
}

impl NoteDraft {
    pub fn from_message(message: &Message) -> Self {
        let (text, _) = message.body();
        let links = message.links();

        let mut tags: Vec<String> = BASE_TAGS.iter().map(|t| t.to_string()).collect();
        tags.extend(
            message
                .hashtags()
                .into_iter()
                .map(|h| format!("{}{}", HASHTAG_TAG_PREFIX, h)),
        );
        if !links.is_empty() {
            tags.push(LINKS_TAG.to_string());
        }

        Self {
            title: message.forward_label().unwrap_or_default(),
            text: text.to_string(),
            tags,
            links,
        }
    }

    /// The link to expand, present only when the message has exactly one.
    pub fn single_link(&self) -> Option<&str> {
        match self.links.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }

    /// Replace title and text with the article behind `url`.
    pub fn apply_article(&mut self, url: &str, article: Article) {
        self.text = format!("Original: {}\n\n{}", url, article.markdown);
        self.title = article.meta.title;
    }
}

/// Files messages as notes: login, sync, optional link expansion, add note,
/// logout. Each message gets its own backend session.
pub struct MessageOrchestrator {
    config: Arc<AppConfig>,
    sync: SyncConfig,
    articles: Arc<dyn ArticleSource>,
}

impl MessageOrchestrator {
    pub fn new(config: Arc<AppConfig>, articles: Arc<dyn ArticleSource>) -> Self {
        let sync = config.sync_config();
        Self {
            config,
            sync,
            articles,
        }
    }

    /// Override the backend settings derived from the app config.
    pub fn with_sync_config(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }

    /// Handle one message and return the confirmation to send back.
    #[instrument(
        skip(self, message),
        fields(
            subsystem = "bot",
            component = "orchestrator",
            op = "handle_message",
            chat_id = message.chat.id,
            message_id = message.message_id
        )
    )]
    pub async fn handle_message(&self, message: &Message) -> Result<String> {
        let start = Instant::now();

        let mut store = NoteStore::new(self.sync.clone())?;
        store
            .login(&self.config.notes_email, &self.config.notes_password)
            .await?;

        let filed = self.file_note(&mut store, message).await;
        if let Err(e) = store.logout().await {
            warn!(error = %e, "Logout after message failed");
        }
        let (note_id, draft) = filed?;

        info!(
            note_id = %note_id,
            tag_count = draft.tags.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Message filed as note"
        );
        Ok(reply::confirmation(
            &draft.title,
            &draft.tags,
            self.config.reply_format,
        ))
    }

    async fn file_note(&self, store: &mut NoteStore, message: &Message) -> Result<(Uuid, NoteDraft)> {
        store.sync().await?;

        let mut draft = NoteDraft::from_message(message);
        if let Some(url) = draft.single_link().map(str::to_string) {
            let article = self.articles.extract(&url).await?;
            debug!(url = %url, title = %article.meta.title, "Link expanded");
            draft.apply_article(&url, article);
        } else if !draft.links.is_empty() {
            debug!(link_count = draft.links.len(), "Several links, none expanded");
        }

        let note_id = store.add_note(&draft.title, &draft.text, &draft.tags).await?;
        Ok((note_id, draft))
    }
}
