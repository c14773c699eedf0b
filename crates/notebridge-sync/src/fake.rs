//! In-process fake note backend for tests.
//!
//! Serves the auth and sync endpoints from a [`wiremock::MockServer`] and
//! keeps pushed items in memory, so a [`NoteStore`](crate::NoteStore) can run
//! a full login, sync, add-note cycle without a real backend. The fake
//! shares the account's key chain and can decrypt what it stores for
//! assertions.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use notebridge_sync::fake::FakeSyncServer;
//! use notebridge_sync::NoteStore;
//!
//! #[tokio::test]
//! async fn test_with_fake_backend() {
//!     let fake = FakeSyncServer::start("me@example.com", "hunter2").await;
//!     let mut store = NoteStore::new(fake.sync_config()).unwrap();
//!     store.login(fake.email(), fake.password()).await.unwrap();
//!     store.sync().await.unwrap();
//!
//!     let id = store.add_note("Title", "Body", &["inbox".into()]).await.unwrap();
//!     assert_eq!(fake.tag_references("inbox"), Some(vec![id]));
//! }
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use notebridge_core::defaults::PROTOCOL_VERSION;
use notebridge_core::{
    ContentType, DecryptedItem, EncryptedItem, ItemContent, ItemsKeyContent, Note, Reference, Tag,
};
use notebridge_crypto::{derive_root_key, password_salt, KdfParams, SymmetricKey};

use crate::item::{seal_item, unseal_item};
use crate::keychain::KeyChain;
use crate::store::SyncConfig;
use crate::types::{AuthParams, SignInRequest, SyncConflict, SyncRequest, SyncResponse};

/// Cheap Argon2id parameters so tests derive keys in milliseconds.
pub fn fast_kdf() -> KdfParams {
    KdfParams {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

struct FakeState {
    params: AuthParams,
    server_password: String,
    keys: KeyChain,
    items_key_id: Uuid,
    items: Vec<EncryptedItem>,
    tokens: HashSet<String>,
    issued_tokens: usize,
    sync_counter: usize,
    sign_outs: usize,
    push_sync_tokens: Vec<Option<String>>,
    reject_next_push: bool,
}

impl FakeState {
    fn authorized(&self, request: &Request) -> bool {
        request
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|token| self.tokens.contains(token))
            .unwrap_or(false)
    }

    fn upsert(&mut self, item: EncryptedItem) {
        match self.items.iter_mut().find(|i| i.uuid == item.uuid) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    fn next_sync_token(&mut self) -> String {
        self.sync_counter += 1;
        format!("sync-{}", self.sync_counter)
    }

    fn decrypted(&self, content_type: ContentType) -> Vec<DecryptedItem> {
        self.items
            .iter()
            .filter(|i| !i.deleted && i.content_type == content_type)
            .filter_map(|i| unseal_item(i, &self.keys).ok())
            .collect()
    }
}

fn error_body(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(serde_json::json!({
        "error": { "message": message }
    }))
}

struct ParamsResponder(Arc<Mutex<FakeState>>);

impl Respond for ParamsResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let state = self.0.lock().unwrap();
        let email = request
            .url
            .query_pairs()
            .find(|(k, _)| k == "email")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();

        if email.eq_ignore_ascii_case(&state.params.identifier) {
            ResponseTemplate::new(200).set_body_json(&state.params)
        } else {
            error_body(404, "No account with that email.")
        }
    }
}

struct SignInResponder(Arc<Mutex<FakeState>>);

impl Respond for SignInResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut state = self.0.lock().unwrap();
        let Ok(body) = serde_json::from_slice::<SignInRequest>(&request.body) else {
            return error_body(400, "Malformed request.");
        };

        if !body.email.eq_ignore_ascii_case(&state.params.identifier)
            || body.password != state.server_password
        {
            return error_body(401, "Invalid email or password.");
        }

        state.issued_tokens += 1;
        let token = format!("fake-token-{}", state.issued_tokens);
        state.tokens.insert(token.clone());
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "session": { "access_token": token }
        }))
    }
}

struct SignOutResponder(Arc<Mutex<FakeState>>);

impl Respond for SignOutResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut state = self.0.lock().unwrap();
        if !state.authorized(request) {
            return error_body(401, "Invalid login credentials.");
        }
        let token = request
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string)
            .unwrap_or_default();
        state.tokens.remove(&token);
        state.sign_outs += 1;
        ResponseTemplate::new(204)
    }
}

struct SyncResponder(Arc<Mutex<FakeState>>);

impl Respond for SyncResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut state = self.0.lock().unwrap();
        if !state.authorized(request) {
            return error_body(401, "Invalid login credentials.");
        }
        let Ok(body) = serde_json::from_slice::<SyncRequest>(&request.body) else {
            return error_body(400, "Malformed request.");
        };

        let mut response = SyncResponse::default();

        if !body.items.is_empty() {
            state.push_sync_tokens.push(body.sync_token.clone());
            if state.reject_next_push {
                state.reject_next_push = false;
                response.conflicts = body
                    .items
                    .into_iter()
                    .map(|item| SyncConflict {
                        kind: "sync_conflict".to_string(),
                        server_item: None,
                        unsaved_item: Some(item),
                    })
                    .collect();
                return ResponseTemplate::new(200).set_body_json(&response);
            }
            for item in body.items {
                response.saved_items.push(item.clone());
                state.upsert(item);
            }
            response.sync_token = Some(state.next_sync_token());
            return ResponseTemplate::new(200).set_body_json(&response);
        }

        let matching: Vec<EncryptedItem> = state
            .items
            .iter()
            .filter(|i| body.content_type.map_or(true, |ct| ct == i.content_type))
            .cloned()
            .collect();

        let offset = body
            .cursor_token
            .as_deref()
            .and_then(|c| c.parse::<usize>().ok())
            .unwrap_or(0);
        let limit = body.limit.map(|l| l as usize).unwrap_or(matching.len()).max(1);
        let end = (offset + limit).min(matching.len());

        response.retrieved_items = matching.get(offset..end).unwrap_or_default().to_vec();
        if end < matching.len() {
            response.cursor_token = Some(end.to_string());
        }
        response.sync_token = Some(state.next_sync_token());
        if body.compute_integrity {
            response.integrity_hash = Some(format!("{:064x}", matching.len()));
        }
        ResponseTemplate::new(200).set_body_json(&response)
    }
}

/// Fake note backend holding one account.
pub struct FakeSyncServer {
    server: MockServer,
    state: Arc<Mutex<FakeState>>,
    email: String,
    password: String,
}

impl FakeSyncServer {
    /// Start a backend with one account owning a single default items key.
    pub async fn start(email: &str, password: &str) -> Self {
        let params = AuthParams {
            identifier: email.to_string(),
            pw_nonce: format!("{:032x}", Uuid::new_v4().as_u128()),
            version: PROTOCOL_VERSION.to_string(),
        };
        let salt = password_salt(&params.identifier, &params.pw_nonce);
        let root = derive_root_key(password.as_bytes(), &salt, &fast_kdf()).unwrap();
        let server_password = root.server_password();

        let mut keys = KeyChain::new(root);
        let items_key = SymmetricKey::generate();
        let items_key_item = DecryptedItem::new(
            ItemContent::ItemsKey(ItemsKeyContent {
                items_key: items_key.to_hex(),
                version: PROTOCOL_VERSION.to_string(),
                is_default: true,
            }),
            None,
        );
        let sealed = seal_item(&items_key_item, &keys).unwrap();
        keys.add_items_key(items_key_item.uuid, items_key, true);

        let state = Arc::new(Mutex::new(FakeState {
            params,
            server_password,
            keys,
            items_key_id: items_key_item.uuid,
            items: vec![sealed],
            tokens: HashSet::new(),
            issued_tokens: 0,
            sync_counter: 0,
            sign_outs: 0,
            push_sync_tokens: Vec::new(),
            reject_next_push: false,
        }));

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/params"))
            .respond_with(ParamsResponder(state.clone()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/sign_in"))
            .respond_with(SignInResponder(state.clone()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/sign_out"))
            .respond_with(SignOutResponder(state.clone()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/items/sync"))
            .respond_with(SyncResponder(state.clone()))
            .mount(&server)
            .await;

        Self {
            server,
            state,
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Store settings pointing at this backend, with fast key derivation.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            endpoint: self.uri(),
            kdf: fast_kdf(),
            ..SyncConfig::default()
        }
    }

    pub fn items_key_id(&self) -> Uuid {
        self.state.lock().unwrap().items_key_id
    }

    /// Store a tag referencing `notes`, as if another client created it.
    pub fn seed_tag(&self, title: &str, notes: &[Uuid]) -> Uuid {
        let mut state = self.state.lock().unwrap();
        let mut tag = Tag {
            title: title.to_string(),
            references: Vec::new(),
            app_data: serde_json::json!({}),
        };
        tag.references.extend(notes.iter().copied().map(Reference::note));
        let item = DecryptedItem::new(ItemContent::Tag(tag), Some(state.items_key_id));
        let sealed = seal_item(&item, &state.keys).unwrap();
        state.upsert(sealed);
        item.uuid
    }

    /// Make the next push answer with a conflict for every item.
    pub fn reject_next_push(&self) {
        self.state.lock().unwrap().reject_next_push = true;
    }

    /// Titles of stored tags, in storage order.
    pub fn tag_titles(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .decrypted(ContentType::Tag)
            .iter()
            .filter_map(|i| i.as_tag().map(|t| t.title.clone()))
            .collect()
    }

    /// Number of stored tags with `title`.
    pub fn tag_count(&self, title: &str) -> usize {
        self.tag_titles().iter().filter(|t| *t == title).count()
    }

    /// Note UUIDs the tag titled `title` references, in order.
    pub fn tag_references(&self, title: &str) -> Option<Vec<Uuid>> {
        self.state
            .lock()
            .unwrap()
            .decrypted(ContentType::Tag)
            .iter()
            .filter_map(|i| i.as_tag())
            .find(|t| t.title == title)
            .map(|t| t.references.iter().map(|r| r.uuid).collect())
    }

    pub fn note(&self, uuid: Uuid) -> Option<Note> {
        self.state
            .lock()
            .unwrap()
            .decrypted(ContentType::Note)
            .into_iter()
            .find(|i| i.uuid == uuid)
            .and_then(|i| match i.content {
                ItemContent::Note(note) => Some(note),
                _ => None,
            })
    }

    pub fn note_count(&self) -> usize {
        self.state.lock().unwrap().decrypted(ContentType::Note).len()
    }

    /// Whether any stored item exposes `needle` without decryption.
    pub fn stores_plaintext(&self, needle: &str) -> bool {
        let state = self.state.lock().unwrap();
        state.items.iter().any(|i| {
            i.content.as_deref().map_or(false, |c| c.contains(needle))
                || i.enc_item_key.as_deref().map_or(false, |c| c.contains(needle))
        })
    }

    /// Sync token sent with each push, in order.
    pub fn push_sync_tokens(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().push_sync_tokens.clone()
    }

    pub fn push_count(&self) -> usize {
        self.state.lock().unwrap().push_sync_tokens.len()
    }

    pub fn sign_out_count(&self) -> usize {
        self.state.lock().unwrap().sign_outs
    }
}
