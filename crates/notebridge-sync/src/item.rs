//! Seal/unseal boundary between [`DecryptedItem`] and [`EncryptedItem`].
//!
//! Each item gets a fresh random item key. The payload is sealed under the
//! item key, the item key is sealed under the wrapping key from the
//! [`KeyChain`], and both are bound to the item UUID.

use notebridge_core::{
    ContentType, DecryptedItem, EncryptedItem, Error, ItemContent, ItemsKeyContent, Note, Result,
    Tag,
};
use notebridge_crypto::{open, seal, AuthenticatedData, SymmetricKey};

use crate::keychain::KeyChain;

/// Encrypt an item for transmission.
pub fn seal_item(item: &DecryptedItem, keys: &KeyChain) -> Result<EncryptedItem> {
    let content_type = item.content_type();
    let wrapping = keys
        .wrapping_key(content_type, item.items_key_id)
        .map_err(|e| Error::Seal(e.to_string()))?;

    let payload = match &item.content {
        ItemContent::Note(note) => serde_json::to_vec(note),
        ItemContent::Tag(tag) => serde_json::to_vec(tag),
        ItemContent::ItemsKey(key) => serde_json::to_vec(key),
    }
    .map_err(|e| Error::Seal(format!("payload encoding failed: {}", e)))?;

    let aad = AuthenticatedData::for_item(item.uuid.to_string());
    let item_key = SymmetricKey::generate();

    let content = seal(&item_key, &payload, &aad).map_err(|e| Error::Seal(e.to_string()))?;
    let enc_item_key = seal(wrapping, item_key.to_hex().as_bytes(), &aad)
        .map_err(|e| Error::Seal(e.to_string()))?;

    Ok(EncryptedItem {
        uuid: item.uuid,
        content_type,
        items_key_id: match content_type {
            ContentType::ItemsKey => None,
            _ => item.items_key_id,
        },
        enc_item_key: Some(enc_item_key),
        content: Some(content),
        created_at: item.created_at,
        updated_at: item.updated_at,
        deleted: false,
    })
}

/// Decrypt an item received from the backend.
pub fn unseal_item(item: &EncryptedItem, keys: &KeyChain) -> Result<DecryptedItem> {
    let (enc_item_key, content) = match (&item.enc_item_key, &item.content) {
        (Some(k), Some(c)) => (k, c),
        _ => {
            return Err(Error::Unseal(format!(
                "item {} has no sealed content",
                item.uuid
            )))
        }
    };

    let wrapping = keys
        .wrapping_key(item.content_type, item.items_key_id)
        .map_err(|e| Error::Unseal(format!("item {}: {}", item.uuid, e)))?;

    let aad = AuthenticatedData::for_item(item.uuid.to_string());
    let unseal_err = |e: notebridge_crypto::CryptoError| {
        Error::Unseal(format!("item {}: {}", item.uuid, e))
    };

    let item_key_hex = open(wrapping, enc_item_key, &aad).map_err(unseal_err)?;
    let item_key_hex = String::from_utf8(item_key_hex)
        .map_err(|_| Error::Unseal(format!("item {}: item key is not text", item.uuid)))?;
    let item_key = SymmetricKey::from_hex(&item_key_hex).map_err(unseal_err)?;

    let payload = open(&item_key, content, &aad).map_err(unseal_err)?;
    let decode_err = |e: serde_json::Error| {
        Error::Unseal(format!("item {}: payload decoding failed: {}", item.uuid, e))
    };

    let content = match item.content_type {
        ContentType::Note => {
            ItemContent::Note(serde_json::from_slice::<Note>(&payload).map_err(decode_err)?)
        }
        ContentType::Tag => {
            ItemContent::Tag(serde_json::from_slice::<Tag>(&payload).map_err(decode_err)?)
        }
        ContentType::ItemsKey => ItemContent::ItemsKey(
            serde_json::from_slice::<ItemsKeyContent>(&payload).map_err(decode_err)?,
        ),
        ContentType::Other => {
            return Err(Error::Unseal(format!(
                "item {}: unsupported content type",
                item.uuid
            )))
        }
    };

    Ok(DecryptedItem {
        uuid: item.uuid,
        content,
        items_key_id: item.items_key_id,
        created_at: item.created_at,
        updated_at: item.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keychain::tests::test_root_key;
    use notebridge_core::{ErrorKind, Reference};
    use uuid::Uuid;

    fn keychain_with_items_key() -> (KeyChain, Uuid) {
        let mut keys = KeyChain::new(test_root_key());
        let id = Uuid::new_v4();
        keys.add_items_key(id, SymmetricKey::generate(), true);
        (keys, id)
    }

    #[test]
    fn test_note_seal_unseal() {
        let (keys, items_key) = keychain_with_items_key();
        let mut note = Note::new("Title", "Body text");
        note.set_updated_at_now();
        let item = DecryptedItem::new(ItemContent::Note(note), Some(items_key));

        let sealed = seal_item(&item, &keys).unwrap();
        assert_eq!(sealed.content_type, ContentType::Note);
        assert_eq!(sealed.items_key_id, Some(items_key));
        assert!(!sealed.content.as_deref().unwrap().contains("Body text"));

        let opened = unseal_item(&sealed, &keys).unwrap();
        assert_eq!(opened, item);
    }

    #[test]
    fn test_items_key_sealed_under_master_key() {
        let keys = KeyChain::new(test_root_key());
        let content = ItemsKeyContent {
            items_key: SymmetricKey::generate().to_hex(),
            version: "004".to_string(),
            is_default: true,
        };
        let item = DecryptedItem::new(ItemContent::ItemsKey(content), None);

        let sealed = seal_item(&item, &keys).unwrap();
        assert!(sealed.items_key_id.is_none());

        let opened = unseal_item(&sealed, &keys).unwrap();
        assert_eq!(opened.content, item.content);
    }

    #[test]
    fn test_seal_without_items_key_fails() {
        let keys = KeyChain::new(test_root_key());
        let item = DecryptedItem::new(ItemContent::Note(Note::new("a", "b")), None);

        let err = seal_item(&item, &keys).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Seal);
    }

    #[test]
    fn test_content_moved_to_other_item_fails() {
        let (keys, items_key) = keychain_with_items_key();
        let tag = Tag::new("inbox", Reference::note(Uuid::new_v4()));
        let item = DecryptedItem::new(ItemContent::Tag(tag), Some(items_key));

        let mut sealed = seal_item(&item, &keys).unwrap();
        sealed.uuid = Uuid::new_v4();

        let err = unseal_item(&sealed, &keys).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unseal);
    }

    #[test]
    fn test_unseal_with_other_key_chain_fails() {
        let (keys, items_key) = keychain_with_items_key();
        let item = DecryptedItem::new(ItemContent::Note(Note::new("a", "b")), Some(items_key));
        let sealed = seal_item(&item, &keys).unwrap();

        let mut other = KeyChain::new(test_root_key());
        other.add_items_key(items_key, SymmetricKey::generate(), true);

        let err = unseal_item(&sealed, &other).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unseal);
    }

    #[test]
    fn test_unseal_deleted_item_fails() {
        let (keys, _) = keychain_with_items_key();
        let item = EncryptedItem {
            uuid: Uuid::new_v4(),
            content_type: ContentType::Tag,
            items_key_id: None,
            enc_item_key: None,
            content: None,
            created_at: None,
            updated_at: None,
            deleted: true,
        };
        assert!(unseal_item(&item, &keys).is_err());
    }
}
