//! Item model shared by the note backend client and its callers.
//!
//! An item travels in two shapes: [`EncryptedItem`] is the envelope exchanged
//! with the backend, [`DecryptedItem`] carries the plaintext payload as an
//! [`ItemContent`] variant. Conversions between the two happen only at the
//! seal/unseal boundary in `notebridge-sync`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

/// App-data domain the reference client stores its bookkeeping under.
pub const APP_DATA_DOMAIN: &str = "org.standardnotes.sn";

// =============================================================================
// CONTENT TYPES
// =============================================================================

/// Content-type discriminator carried in clear on every item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    #[serde(rename = "Note")]
    Note,
    #[serde(rename = "Tag")]
    Tag,
    #[serde(rename = "SN|ItemsKey")]
    ItemsKey,
    /// Any content type this client does not handle (components, preferences, ...).
    #[serde(other)]
    Other,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Note => "Note",
            ContentType::Tag => "Tag",
            ContentType::ItemsKey => "SN|ItemsKey",
            ContentType::Other => "Other",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pointer from a tag to a tagged item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub uuid: Uuid,
    pub content_type: ContentType,
}

impl Reference {
    pub fn note(uuid: Uuid) -> Self {
        Self {
            uuid,
            content_type: ContentType::Note,
        }
    }
}

fn empty_app_data() -> JsonValue {
    json!({})
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// Decrypted payload of a Note item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(rename = "appData", default = "empty_app_data")]
    pub app_data: JsonValue,
}

impl Note {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            references: Vec::new(),
            app_data: empty_app_data(),
        }
    }

    /// Stamp the client-side last-updated time into the app data blob.
    pub fn set_updated_at(&mut self, at: DateTime<Utc>) {
        if !self.app_data.is_object() {
            self.app_data = empty_app_data();
        }
        let stamp = at.to_rfc3339_opts(SecondsFormat::Millis, true);
        self.app_data[APP_DATA_DOMAIN]["client_updated_at"] = JsonValue::String(stamp);
    }

    pub fn set_updated_at_now(&mut self) {
        self.set_updated_at(Utc::now());
    }

    /// Client-side last-updated time, if one was stamped.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.app_data
            .get(APP_DATA_DOMAIN)?
            .get("client_updated_at")?
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Decrypted payload of a Tag item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub title: String,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(rename = "appData", default = "empty_app_data")]
    pub app_data: JsonValue,
}

impl Tag {
    /// New tag whose reference list contains exactly `first`.
    pub fn new(title: impl Into<String>, first: Reference) -> Self {
        Self {
            title: title.into(),
            references: vec![first],
            app_data: empty_app_data(),
        }
    }

    /// Whether the tag already points at `uuid`.
    pub fn references_item(&self, uuid: Uuid) -> bool {
        self.references.iter().any(|r| r.uuid == uuid)
    }

    /// Append a reference unless one to the same UUID exists.
    ///
    /// Returns `true` if the list changed. The first reference to a UUID
    /// wins; entries already stored are never removed or reordered.
    pub fn add_reference(&mut self, reference: Reference) -> bool {
        if self.references_item(reference.uuid) {
            return false;
        }
        self.references.push(reference);
        true
    }
}

/// Decrypted payload of an items-key item.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemsKeyContent {
    /// Hex-encoded 256-bit key.
    #[serde(rename = "itemsKey")]
    pub items_key: String,
    pub version: String,
    #[serde(rename = "isDefault", default)]
    pub is_default: bool,
}

impl std::fmt::Debug for ItemsKeyContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemsKeyContent")
            .field("items_key", &"[REDACTED]")
            .field("version", &self.version)
            .field("is_default", &self.is_default)
            .finish()
    }
}

/// Plaintext payload of an item, one variant per handled content type.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemContent {
    Note(Note),
    Tag(Tag),
    ItemsKey(ItemsKeyContent),
}

impl ItemContent {
    pub fn content_type(&self) -> ContentType {
        match self {
            ItemContent::Note(_) => ContentType::Note,
            ItemContent::Tag(_) => ContentType::Tag,
            ItemContent::ItemsKey(_) => ContentType::ItemsKey,
        }
    }
}

// =============================================================================
// ITEMS
// =============================================================================

/// Item with its payload in plaintext.
#[derive(Debug, Clone, PartialEq)]
pub struct DecryptedItem {
    pub uuid: Uuid,
    pub content: ItemContent,
    /// Items key the payload is (or will be) sealed under. `None` for
    /// items keys themselves, which are sealed under the master key.
    pub items_key_id: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DecryptedItem {
    /// Fresh item with a random UUID.
    pub fn new(content: ItemContent, items_key_id: Option<Uuid>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            content,
            items_key_id,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn content_type(&self) -> ContentType {
        self.content.content_type()
    }

    pub fn reference(&self) -> Reference {
        Reference {
            uuid: self.uuid,
            content_type: self.content_type(),
        }
    }

    pub fn as_tag(&self) -> Option<&Tag> {
        match &self.content {
            ItemContent::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn as_tag_mut(&mut self) -> Option<&mut Tag> {
        match &mut self.content {
            ItemContent::Tag(tag) => Some(tag),
            _ => None,
        }
    }
}

/// Item envelope as exchanged with the backend.
///
/// `content` and `enc_item_key` are protocol strings produced by the seal
/// step; deleted items arrive with both absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptedItem {
    pub uuid: Uuid,
    pub content_type: ContentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_key_id: Option<Uuid>,
    #[serde(default)]
    pub enc_item_key: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted: bool,
}

// =============================================================================
// ARTICLES
// =============================================================================

/// Metadata extracted alongside an article body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub title: String,
    /// Length in characters of the readable text.
    pub length: usize,
    pub site_name: Option<String>,
    /// Absolute URL of the hero image.
    pub image: Option<String>,
}

/// Readable article resolved from a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub markdown: String,
    pub meta: PageMeta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_content_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&ContentType::ItemsKey).unwrap(),
            "\"SN|ItemsKey\""
        );
        assert_eq!(serde_json::to_string(&ContentType::Tag).unwrap(), "\"Tag\"");
    }

    #[test]
    fn test_unknown_content_type_is_other() {
        let parsed: ContentType = serde_json::from_str("\"SN|Component\"").unwrap();
        assert_eq!(parsed, ContentType::Other);
    }

    #[test]
    fn test_note_updated_at_stamp() {
        let mut note = Note::new("Title", "Body");
        assert!(note.updated_at().is_none());

        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        note.set_updated_at(at);

        assert_eq!(note.updated_at(), Some(at));
        assert_eq!(
            note.app_data[APP_DATA_DOMAIN]["client_updated_at"],
            "2024-05-01T12:30:00.000Z"
        );
    }

    #[test]
    fn test_note_payload_uses_app_data_key() {
        let note = Note::new("T", "x");
        let value = serde_json::to_value(&note).unwrap();
        assert!(value.get("appData").is_some());
        assert!(value.get("app_data").is_none());
    }

    #[test]
    fn test_tag_add_reference_keeps_first() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let mut tag = Tag::new("inbox", Reference::note(first));

        assert!(tag.add_reference(Reference::note(second)));
        assert!(!tag.add_reference(Reference::note(first)));
        assert!(!tag.add_reference(Reference::note(second)));

        let uuids: Vec<Uuid> = tag.references.iter().map(|r| r.uuid).collect();
        assert_eq!(uuids, vec![first, second]);
    }

    #[test]
    fn test_tag_payload_without_references_parses() {
        let tag: Tag = serde_json::from_str(r#"{"title":"links"}"#).unwrap();
        assert!(tag.references.is_empty());
        assert!(tag.app_data.is_object());
    }

    #[test]
    fn test_items_key_debug_redacted() {
        let content = ItemsKeyContent {
            items_key: "deadbeef".to_string(),
            version: "004".to_string(),
            is_default: true,
        };
        let debug = format!("{:?}", content);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("deadbeef"));
    }

    #[test]
    fn test_deleted_item_envelope_parses() {
        let json = r#"{"uuid":"6b1f2d0e-2f4a-4a49-8a39-4f0c8f2e7c11","content_type":"Tag","content":null,"enc_item_key":null,"deleted":true}"#;
        let item: EncryptedItem = serde_json::from_str(json).unwrap();
        assert!(item.deleted);
        assert!(item.content.is_none());
    }

    #[test]
    fn test_decrypted_item_reference() {
        let item = DecryptedItem::new(ItemContent::Note(Note::new("a", "b")), None);
        let reference = item.reference();
        assert_eq!(reference.uuid, item.uuid);
        assert_eq!(reference.content_type, ContentType::Note);
    }
}
