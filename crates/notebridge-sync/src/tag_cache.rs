//! Tags known to the account, keyed by title.

use std::collections::HashMap;

use tracing::debug;

use notebridge_core::{ContentType, DecryptedItem, EncryptedItem, Result};

use crate::item::unseal_item;
use crate::keychain::KeyChain;

/// Decrypted tag items keyed by title.
///
/// Built from one full retrieval and owned by the operation that built it.
#[derive(Debug, Default)]
pub struct TagCache {
    tags: HashMap<String, DecryptedItem>,
}

impl TagCache {
    /// Unseal every live tag in `items`.
    ///
    /// When two tags share a title the later one wins. Any item that fails
    /// to unseal fails the whole build.
    pub fn from_items(items: &[EncryptedItem], keys: &KeyChain) -> Result<Self> {
        let mut tags = HashMap::new();
        let mut skipped = 0usize;

        for item in items {
            if item.deleted || item.content_type != ContentType::Tag {
                skipped += 1;
                continue;
            }
            let decrypted = unseal_item(item, keys)?;
            if let Some(title) = decrypted.as_tag().map(|t| t.title.clone()) {
                tags.insert(title, decrypted);
            }
        }

        debug!(tag_count = tags.len(), skipped, "Tag cache built");
        Ok(Self { tags })
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn contains(&self, title: &str) -> bool {
        self.tags.contains_key(title)
    }

    pub fn get(&self, title: &str) -> Option<&DecryptedItem> {
        self.tags.get(title)
    }

    /// Remove and return the tag so the caller can modify it.
    pub fn take(&mut self, title: &str) -> Option<DecryptedItem> {
        self.tags.remove(title)
    }
}
