//! Bot API message model and the parsing the orchestrator needs from it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::warn;
use url::Url;

/// One entry of a `getUpdates` response.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    /// Absent for update kinds the bridge does not handle.
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
    #[serde(default)]
    pub caption_entities: Vec<MessageEntity>,
    #[serde(default)]
    pub forward_from_chat: Option<Chat>,
    #[serde(default)]
    pub forward_from_message_id: Option<i64>,
    /// Replaces the `forward_from_*` fields in newer Bot API versions.
    #[serde(default)]
    pub forward_origin: Option<MessageOrigin>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageOrigin {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub chat: Option<Chat>,
    #[serde(default)]
    pub message_id: Option<i64>,
}

/// Annotated span of a message. `offset` and `length` count UTF-16 code
/// units.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: usize,
    pub length: usize,
    #[serde(default)]
    pub url: Option<String>,
}

impl MessageEntity {
    pub fn new(kind: &str, offset: usize, length: usize) -> Self {
        Self {
            kind: kind.to_string(),
            offset,
            length,
            url: None,
        }
    }
}

const HASHTAG_ENTITY: &str = "hashtag";

/// Bare URLs, with or without a scheme. Scheme-less candidates are kept
/// only when their suffix is on the public suffix list, so `docs.rs/serde`
/// is a link and `notes.txt` is not.
static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:https?|ftp)://[^\s<>]+|\b(?:[\p{L}\p{N}](?:[\p{L}\p{N}-]*[\p{L}\p{N}])?\.)+\p{L}{2,}\b(?::\d{1,5})?(?:/[^\s<>]*)?",
    )
    .expect("URL pattern is valid")
});

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"'];

impl Message {
    pub fn sender_id(&self) -> Option<i64> {
        self.from.as_ref().map(|u| u.id)
    }

    /// Text to file and the entities annotating it. The caption and its
    /// entities are used when the message has no text.
    pub fn body(&self) -> (&str, &[MessageEntity]) {
        match self.text.as_deref() {
            Some(text) if !text.is_empty() => (text, self.entities.as_slice()),
            _ => (
                self.caption.as_deref().unwrap_or_default(),
                self.caption_entities.as_slice(),
            ),
        }
    }

    /// Entity link targets followed by URLs found in the text.
    ///
    /// Both sources are kept, so a link can appear twice.
    pub fn links(&self) -> Vec<String> {
        let (text, entities) = self.body();
        let mut links: Vec<String> = entities.iter().filter_map(|e| e.url.clone()).collect();
        links.extend(find_urls(text));
        links
    }

    /// Hashtag names without the leading `#`, in entity order.
    pub fn hashtags(&self) -> Vec<String> {
        let (text, entities) = self.body();
        let units: Vec<u16> = text.encode_utf16().collect();

        entities
            .iter()
            .filter(|e| e.kind == HASHTAG_ENTITY)
            .filter_map(|e| {
                if e.length == 0 {
                    warn!(offset = e.offset, "Empty hashtag entity, skipped");
                    return None;
                }
                let tag = utf16_span(&units, e.offset + 1, e.offset + e.length);
                if tag.is_none() {
                    warn!(
                        offset = e.offset,
                        length = e.length,
                        text_units = units.len(),
                        "Hashtag entity outside message text, skipped"
                    );
                }
                tag.filter(|t| !t.is_empty())
            })
            .collect()
    }

    /// `"<chat title> #<message id>"` for messages forwarded from a chat.
    pub fn forward_label(&self) -> Option<String> {
        let (chat, message_id) = match (&self.forward_from_chat, &self.forward_origin) {
            (Some(chat), _) => (chat, self.forward_from_message_id),
            (None, Some(origin)) => (origin.chat.as_ref()?, origin.message_id),
            (None, None) => return None,
        };
        Some(format!(
            "{} #{}",
            chat.title.as_deref().unwrap_or_default(),
            message_id.unwrap_or_default()
        ))
    }
}

/// Decode `units[start..end]`, or `None` when the range is not inside the
/// text.
fn utf16_span(units: &[u16], start: usize, end: usize) -> Option<String> {
    if start > end || end > units.len() {
        return None;
    }
    Some(String::from_utf16_lossy(&units[start..end]))
}

fn find_urls(text: &str) -> Vec<String> {
    URL_PATTERN
        .find_iter(text)
        .filter(|m| !text[..m.start()].ends_with('@'))
        .map(|m| trim_url(m.as_str()))
        .filter(|u| !u.is_empty())
        .filter_map(|u| {
            if u.contains("://") {
                Some(u.to_string())
            } else if has_public_suffix(u) {
                Some(format!("https://{}", u))
            } else {
                None
            }
        })
        .collect()
}

/// Whether the host of a scheme-less candidate ends in a listed suffix.
/// Internationalized hosts are checked in both Unicode and punycode form.
fn has_public_suffix(candidate: &str) -> bool {
    let host = candidate
        .split(|c| c == '/' || c == ':')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    let known = |name: &str| psl::suffix(name.as_bytes()).is_some_and(|s| s.is_known());
    if known(&host) {
        return true;
    }
    Url::parse(&format!("https://{}/", host))
        .ok()
        .and_then(|url| url.host_str().map(known))
        .unwrap_or(false)
}

/// Strip sentence punctuation and unbalanced closing parentheses.
fn trim_url(mut url: &str) -> &str {
    loop {
        let trimmed = url.trim_end_matches(TRAILING_PUNCTUATION);
        let trimmed = if trimmed.ends_with(')')
            && trimmed.matches(')').count() > trimmed.matches('(').count()
        {
            &trimmed[..trimmed.len() - 1]
        } else {
            trimmed
        };
        if trimmed.len() == url.len() {
            return url;
        }
        url = trimmed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_message(text: &str, entities: Vec<MessageEntity>) -> Message {
        Message {
            message_id: 1,
            chat: Chat {
                id: 10,
                title: None,
            },
            text: Some(text.to_string()),
            entities,
            ..Default::default()
        }
    }

    fn utf16_len(s: &str) -> usize {
        s.encode_utf16().count()
    }

    #[test]
    fn test_deserialize_update() {
        let json = r#"{
            "update_id": 5,
            "message": {
                "message_id": 77,
                "from": {"id": 42, "is_bot": false, "first_name": "Ann"},
                "chat": {"id": 42, "type": "private"},
                "date": 1700000000,
                "text": "hi #x",
                "entities": [{"type": "hashtag", "offset": 3, "length": 2}]
            }
        }"#;
        let update: Update = serde_json::from_str(json).unwrap();
        let msg = update.message.unwrap();
        assert_eq!(msg.sender_id(), Some(42));
        assert_eq!(msg.chat.id, 42);
        assert_eq!(msg.hashtags(), vec!["x"]);
    }

    #[test]
    fn test_update_without_message() {
        let update: Update =
            serde_json::from_str(r#"{"update_id": 6, "edited_message": {}}"#).unwrap();
        assert!(update.message.is_none());
    }

    #[test]
    fn test_body_falls_back_to_caption_and_its_entities() {
        let msg = Message {
            text: Some(String::new()),
            caption: Some("photo #trip".to_string()),
            caption_entities: vec![MessageEntity::new("hashtag", 6, 5)],
            ..Default::default()
        };
        let (text, entities) = msg.body();
        assert_eq!(text, "photo #trip");
        assert_eq!(entities.len(), 1);
        assert_eq!(msg.hashtags(), vec!["trip"]);
    }

    #[test]
    fn test_body_empty_message() {
        let msg = Message::default();
        assert_eq!(msg.body().0, "");
        assert!(msg.links().is_empty());
        assert!(msg.hashtags().is_empty());
    }

    #[test]
    fn test_hashtag_after_emoji_uses_utf16_offsets() {
        let prefix = "😀 ";
        let text = format!("{}#tag", prefix);
        let offset = utf16_len(prefix);
        assert_eq!(offset, 3);

        let msg = text_message(&text, vec![MessageEntity::new("hashtag", offset, 4)]);
        assert_eq!(msg.hashtags(), vec!["tag"]);
    }

    #[test]
    fn test_hashtag_after_multi_code_point_emoji() {
        let prefix = "Family 👨‍👩‍👧 trip ";
        let text = format!("{}#summer and #beach", prefix);
        let first = utf16_len(prefix);
        let second = utf16_len(&format!("{}#summer and ", prefix));

        let msg = text_message(
            &text,
            vec![
                MessageEntity::new("hashtag", first, 7),
                MessageEntity::new("bold", 0, 6),
                MessageEntity::new("hashtag", second, 6),
            ],
        );
        assert_eq!(msg.hashtags(), vec!["summer", "beach"]);
    }

    #[test]
    fn test_hashtag_out_of_range_is_skipped() {
        let msg = text_message(
            "#ok",
            vec![
                MessageEntity::new("hashtag", 0, 3),
                MessageEntity::new("hashtag", 2, 10),
            ],
        );
        assert_eq!(msg.hashtags(), vec!["ok"]);
    }

    #[test]
    fn test_zero_length_hashtag_is_skipped() {
        let msg = text_message(
            "#a #ok",
            vec![
                MessageEntity::new("hashtag", 0, 0),
                MessageEntity::new("hashtag", 0, 1),
                MessageEntity::new("hashtag", 3, 3),
            ],
        );
        assert_eq!(msg.hashtags(), vec!["ok"]);
    }

    #[test]
    fn test_links_from_text() {
        let msg = text_message("Check this out #cool https://example.com/article", vec![]);
        assert_eq!(msg.links(), vec!["https://example.com/article"]);
    }

    #[test]
    fn test_links_entities_first_and_not_deduplicated() {
        let mut entity = MessageEntity::new("text_link", 0, 4);
        entity.url = Some("https://example.com/a".to_string());
        let msg = text_message("here https://example.com/a", vec![entity]);

        assert_eq!(
            msg.links(),
            vec!["https://example.com/a", "https://example.com/a"]
        );
    }

    #[test]
    fn test_bare_domain_gets_scheme() {
        let msg = text_message("see example.org/docs, thanks", vec![]);
        assert_eq!(msg.links(), vec!["https://example.org/docs"]);
    }

    #[test]
    fn test_bare_domains_on_any_listed_suffix() {
        let msg = text_message(
            "read docs.rs/serde, rust-lang.rs/book and example.travel/x",
            vec![],
        );
        assert_eq!(
            msg.links(),
            vec![
                "https://docs.rs/serde",
                "https://rust-lang.rs/book",
                "https://example.travel/x"
            ]
        );
    }

    #[test]
    fn test_bare_internationalized_domain() {
        let msg = text_message("статья: пример.рф/статья", vec![]);
        assert_eq!(msg.links(), vec!["https://пример.рф/статья"]);
    }

    #[test]
    fn test_no_false_positive_links() {
        let msg = text_message("notes.txt v1.2 e.g. mail me@example.com", vec![]);
        assert!(msg.links().is_empty());
    }

    #[test]
    fn test_trailing_punctuation_trimmed() {
        let msg = text_message(
            "Read (https://example.com/x) and https://en.wikipedia.org/wiki/Rust_(language).",
            vec![],
        );
        assert_eq!(
            msg.links(),
            vec![
                "https://example.com/x",
                "https://en.wikipedia.org/wiki/Rust_(language)"
            ]
        );
    }

    #[test]
    fn test_forward_label_legacy_fields() {
        let msg = Message {
            forward_from_chat: Some(Chat {
                id: -100,
                title: Some("Rust News".to_string()),
            }),
            forward_from_message_id: Some(314),
            ..Default::default()
        };
        assert_eq!(msg.forward_label().as_deref(), Some("Rust News #314"));
    }

    #[test]
    fn test_forward_label_from_origin() {
        let json = r#"{
            "message_id": 1,
            "chat": {"id": 1},
            "forward_origin": {"type": "channel", "chat": {"id": -5, "title": "Digest"}, "message_id": 9, "date": 0}
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.forward_label().as_deref(), Some("Digest #9"));
    }

    #[test]
    fn test_forward_label_absent() {
        assert!(text_message("plain", vec![]).forward_label().is_none());
    }
}
