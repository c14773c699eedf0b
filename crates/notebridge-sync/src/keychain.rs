//! Session key chain: the password-derived root key plus every items key
//! unsealed during the session.

use std::collections::HashMap;

use uuid::Uuid;

use notebridge_core::{ContentType, Error, Result};
use notebridge_crypto::{RootKey, SymmetricKey};

pub struct KeyChain {
    root: RootKey,
    items_keys: HashMap<Uuid, SymmetricKey>,
    active_items_key: Option<Uuid>,
    /// Whether the active key was flagged default by its owner.
    active_is_default: bool,
}

impl KeyChain {
    pub fn new(root: RootKey) -> Self {
        Self {
            root,
            items_keys: HashMap::new(),
            active_items_key: None,
            active_is_default: false,
        }
    }

    pub fn root(&self) -> &RootKey {
        &self.root
    }

    /// Record an unsealed items key.
    ///
    /// The latest key becomes active unless a key flagged default is already
    /// active and this one is not.
    pub fn add_items_key(&mut self, uuid: Uuid, key: SymmetricKey, is_default: bool) {
        self.items_keys.insert(uuid, key);
        if is_default || !self.active_is_default {
            self.active_items_key = Some(uuid);
            self.active_is_default = is_default;
        }
    }

    pub fn active_items_key(&self) -> Option<Uuid> {
        self.active_items_key
    }

    pub fn items_key_count(&self) -> usize {
        self.items_keys.len()
    }

    /// Key that wraps item keys of the given content type.
    ///
    /// Items keys are wrapped by the master key; notes and tags by the items
    /// key they name.
    pub fn wrapping_key(
        &self,
        content_type: ContentType,
        items_key_id: Option<Uuid>,
    ) -> Result<&SymmetricKey> {
        match content_type {
            ContentType::ItemsKey => Ok(self.root.master_key()),
            ContentType::Note | ContentType::Tag => {
                let id = items_key_id.ok_or_else(|| {
                    Error::InvalidInput(format!("{} item names no items key", content_type))
                })?;
                self.items_keys
                    .get(&id)
                    .ok_or_else(|| Error::InvalidInput(format!("unknown items key {}", id)))
            }
            ContentType::Other => Err(Error::InvalidInput(
                "unsupported content type".to_string(),
            )),
        }
    }
}

impl std::fmt::Debug for KeyChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyChain")
            .field("root", &self.root)
            .field("items_keys", &self.items_keys.keys().collect::<Vec<_>>())
            .field("active_items_key", &self.active_items_key)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use notebridge_core::ErrorKind;
    use notebridge_crypto::{derive_root_key, password_salt, KdfParams};

    pub(crate) fn test_root_key() -> RootKey {
        let params = KdfParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        };
        let salt = password_salt("me@example.com", "0123456789abcdef");
        derive_root_key(b"hunter2", &salt, &params).unwrap()
    }

    #[test]
    fn test_latest_key_becomes_active() {
        let mut chain = KeyChain::new(test_root_key());
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        chain.add_items_key(first, SymmetricKey::generate(), false);
        chain.add_items_key(second, SymmetricKey::generate(), false);

        assert_eq!(chain.active_items_key(), Some(second));
        assert_eq!(chain.items_key_count(), 2);
    }

    #[test]
    fn test_default_key_stays_active() {
        let mut chain = KeyChain::new(test_root_key());
        let default = Uuid::new_v4();

        chain.add_items_key(default, SymmetricKey::generate(), true);
        chain.add_items_key(Uuid::new_v4(), SymmetricKey::generate(), false);

        assert_eq!(chain.active_items_key(), Some(default));
    }

    #[test]
    fn test_wrapping_key_for_items_key_is_master() {
        let chain = KeyChain::new(test_root_key());
        let key = chain.wrapping_key(ContentType::ItemsKey, None).unwrap();
        assert_eq!(key, chain.root().master_key());
    }

    #[test]
    fn test_wrapping_key_unknown_items_key() {
        let chain = KeyChain::new(test_root_key());
        let err = chain
            .wrapping_key(ContentType::Note, Some(Uuid::new_v4()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_debug_hides_keys() {
        let mut chain = KeyChain::new(test_root_key());
        let key = SymmetricKey::generate();
        let hex = key.to_hex();
        chain.add_items_key(Uuid::new_v4(), key, true);

        let debug = format!("{:?}", chain);
        assert!(!debug.contains(&hex));
    }
}
