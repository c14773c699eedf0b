//! Note store: one authenticated session against the note backend.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use notebridge_core::defaults::{
    KDF_ITERATIONS, KDF_MEMORY_KIB, KDF_PARALLELISM, SYNC_API_VERSION, SYNC_ENDPOINT,
    SYNC_PAGE_LIMIT, SYNC_TIMEOUT_SECS,
};
use notebridge_core::{
    ContentType, DecryptedItem, Error, ItemContent, Note, Reference, Result, ResultExt, Tag,
};
use notebridge_crypto::{derive_root_key, password_salt, KdfParams, SymmetricKey};

use crate::client::SyncClient;
use crate::item::{seal_item, unseal_item};
use crate::keychain::KeyChain;
use crate::tag_cache::TagCache;
use crate::types::SyncRequest;

/// Connection settings for a [`NoteStore`].
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub endpoint: String,
    pub timeout: Duration,
    /// Items requested per retrieval page.
    pub page_limit: u32,
    pub kdf: KdfParams,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: SYNC_ENDPOINT.to_string(),
            timeout: Duration::from_secs(SYNC_TIMEOUT_SECS),
            page_limit: SYNC_PAGE_LIMIT,
            kdf: KdfParams {
                memory_kib: KDF_MEMORY_KIB,
                iterations: KDF_ITERATIONS,
                parallelism: KDF_PARALLELISM,
            },
        }
    }
}

impl SyncConfig {
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug)]
struct Session {
    identifier: String,
    /// `None` once signed out; the key chain stays in memory.
    access_token: Option<String>,
    keys: KeyChain,
    sync_token: Option<String>,
}

impl Session {
    fn token(&self) -> Result<&str> {
        self.access_token
            .as_deref()
            .ok_or_else(|| Error::Auth("session has been signed out".to_string()))
    }
}

/// Creates encrypted notes and links them to tags.
///
/// Every item operation takes `&mut self`, so a store is used by one task
/// at a time. Discard the store to drop the key chain; [`NoteStore::logout`]
/// only ends the backend session.
#[derive(Debug)]
pub struct NoteStore {
    client: SyncClient,
    config: SyncConfig,
    session: Option<Session>,
}

impl NoteStore {
    pub fn new(config: SyncConfig) -> Result<Self> {
        let client = SyncClient::new(&config.endpoint, config.timeout)?;
        Ok(Self {
            client,
            config,
            session: None,
        })
    }

    pub fn is_logged_in(&self) -> bool {
        self.session
            .as_ref()
            .map(|s| s.access_token.is_some())
            .unwrap_or(false)
    }

    /// Items key new notes and tags are sealed under.
    pub fn active_items_key(&self) -> Option<Uuid> {
        self.session.as_ref().and_then(|s| s.keys.active_items_key())
    }

    /// Latest sync token returned by the backend in this session.
    pub fn sync_token(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.sync_token.as_deref())
    }

    /// Authenticate and derive the key chain.
    #[instrument(
        skip(self, password),
        fields(subsystem = "sync", component = "note_store", op = "login")
    )]
    pub async fn login(&mut self, email: &str, password: &str) -> Result<()> {
        self.login_inner(email, password).await.within("login")
    }

    async fn login_inner(&mut self, email: &str, password: &str) -> Result<()> {
        let start = Instant::now();

        let params = self.client.auth_params(email).await?;
        params.integrity_check(email)?;

        let salt = password_salt(&params.identifier, &params.pw_nonce);
        let kdf = self.config.kdf.clone();
        let password = password.as_bytes().to_vec();
        let root = tokio::task::spawn_blocking(move || derive_root_key(&password, &salt, &kdf))
            .await
            .map_err(|e| Error::Internal(format!("key derivation task failed: {}", e)))?
            .map_err(|e| Error::Auth(format!("key derivation failed: {}", e)))?;

        let token = self
            .client
            .sign_in(&params.identifier, root.server_password())
            .await?;

        self.session = Some(Session {
            identifier: params.identifier,
            access_token: Some(token),
            keys: KeyChain::new(root),
            sync_token: None,
        });

        info!(
            duration_ms = start.elapsed().as_millis() as u64,
            "Logged in to note backend"
        );
        Ok(())
    }

    /// Load items keys and select the active one.
    #[instrument(
        skip(self),
        fields(subsystem = "sync", component = "note_store", op = "sync")
    )]
    pub async fn sync(&mut self) -> Result<()> {
        self.sync_inner().await.within("sync")
    }

    async fn sync_inner(&mut self) -> Result<()> {
        let page_limit = self.config.page_limit;
        let client = &self.client;
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| Error::Auth("not logged in".to_string()))?;

        let retrieved = client
            .retrieve_all(session.token()?, ContentType::ItemsKey, page_limit, false)
            .await?;
        if retrieved.sync_token.is_some() {
            session.sync_token = retrieved.sync_token;
        }

        for item in &retrieved.items {
            if item.deleted || item.content_type != ContentType::ItemsKey {
                continue;
            }
            let decrypted = unseal_item(item, &session.keys)?;
            let ItemContent::ItemsKey(content) = decrypted.content else {
                continue;
            };
            let key = SymmetricKey::from_hex(&content.items_key).map_err(|e| {
                Error::Unseal(format!("items key {} is malformed: {}", item.uuid, e))
            })?;
            session
                .keys
                .add_items_key(decrypted.uuid, key, content.is_default);
        }

        match session.keys.active_items_key() {
            Some(id) => debug!(
                items_key = %id,
                item_count = session.keys.items_key_count(),
                "Items keys loaded"
            ),
            None => warn!("Account has no items key; notes cannot be created"),
        }
        Ok(())
    }

    /// Create a note and link it to every tag in `tags`, in one push.
    ///
    /// Returns the new note's UUID. Any failure aborts before the push, so
    /// nothing is written.
    #[instrument(
        skip(self, text),
        fields(subsystem = "sync", component = "note_store", op = "add_note", tag_count = tags.len())
    )]
    pub async fn add_note(&mut self, title: &str, text: &str, tags: &[String]) -> Result<Uuid> {
        self.add_note_inner(title, text, tags).await.within("add_note")
    }

    async fn add_note_inner(&mut self, title: &str, text: &str, tags: &[String]) -> Result<Uuid> {
        let page_limit = self.config.page_limit;
        let client = &self.client;
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| Error::Auth("not logged in".to_string()))?;

        let items_key = session.keys.active_items_key().ok_or_else(|| {
            Error::Seal("no items key loaded; sync before adding notes".to_string())
        })?;

        // 1. Note
        let mut note = Note::new(title, text);
        note.set_updated_at_now();
        let note_item = DecryptedItem::new(ItemContent::Note(note), Some(items_key));
        let note_ref = Reference::note(note_item.uuid);
        let mut batch = vec![seal_item(&note_item, &session.keys).within("create_note_item")?];

        // 2. Tag cache, rebuilt for this call
        let retrieved = client
            .retrieve_all(session.token()?, ContentType::Tag, page_limit, true)
            .await
            .within("sync_tags")?;
        if retrieved.sync_token.is_some() {
            session.sync_token = retrieved.sync_token.clone();
        }
        let mut cache = TagCache::from_items(&retrieved.items, &session.keys).within("sync_tags")?;

        // 3. Link tags
        let mut seen = HashSet::new();
        let mut created = 0usize;
        let mut updated = 0usize;
        for name in tags {
            if !seen.insert(name.as_str()) {
                continue;
            }
            match cache.take(name) {
                Some(mut existing) => {
                    let changed = existing
                        .as_tag_mut()
                        .map(|tag| tag.add_reference(note_ref))
                        .unwrap_or(false);
                    if !changed {
                        debug!(tag = %name, "Tag already references note");
                        continue;
                    }
                    batch.push(seal_item(&existing, &session.keys).within("update_tag_item")?);
                    updated += 1;
                }
                None => {
                    let tag = Tag::new(name.as_str(), note_ref);
                    let item = DecryptedItem::new(ItemContent::Tag(tag), Some(items_key));
                    batch.push(seal_item(&item, &session.keys).within("create_tag_item")?);
                    created += 1;
                }
            }
        }

        // 4. Push
        let item_count = batch.len();
        let request = SyncRequest {
            api: SYNC_API_VERSION.to_string(),
            items: batch,
            sync_token: session.sync_token.clone(),
            ..Default::default()
        };
        let response = client
            .sync(session.token()?, &request)
            .await
            .within("push")?;

        if !response.conflicts.is_empty() {
            return Err(Error::Sync(format!(
                "backend rejected {} of {} items with conflicts",
                response.conflicts.len(),
                item_count
            ))
            .within("push"));
        }
        if response.sync_token.is_some() {
            session.sync_token = response.sync_token;
        }

        info!(
            note_id = %note_item.uuid,
            item_count,
            created_tags = created,
            updated_tags = updated,
            "Note created"
        );
        Ok(note_item.uuid)
    }

    /// End the backend session. The key chain stays in memory until the
    /// store is dropped.
    #[instrument(
        skip(self),
        fields(subsystem = "sync", component = "note_store", op = "logout")
    )]
    pub async fn logout(&mut self) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            debug!("No session to sign out");
            return Ok(());
        };
        let Some(token) = session.access_token.take() else {
            debug!("Session already signed out");
            return Ok(());
        };
        self.client.sign_out(&token).await.within("logout")?;
        debug!(identifier = %session.identifier, "Signed out");
        Ok(())
    }
}
