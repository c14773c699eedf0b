//! MessageOrchestrator against the fake note backend.

mod common;

use std::sync::Arc;

use notebridge_bot::{MessageEntity, MessageOrchestrator};
use notebridge_core::{ErrorKind, ExtractionError};
use notebridge_sync::fake::FakeSyncServer;
use uuid::Uuid;

use common::{app_config, owner_message, StubArticles, EMAIL, PASSWORD};

fn orchestrator(
    fake: &FakeSyncServer,
    password: &str,
    articles: Arc<StubArticles>,
) -> MessageOrchestrator {
    let endpoint = fake.uri();
    let config = app_config(&[
        ("STANDARDNOTES_ENDPOINT", endpoint.as_str()),
        ("STANDARDNOTES_PASSWORD", password),
    ]);
    MessageOrchestrator::new(config, articles).with_sync_config(fake.sync_config())
}

/// The only note every base tag points at.
fn filed_note_id(fake: &FakeSyncServer) -> Uuid {
    let refs = fake.tag_references("telegram").expect("telegram tag exists");
    assert_eq!(refs.len(), 1);
    refs[0]
}

fn sorted(mut v: Vec<String>) -> Vec<String> {
    v.sort();
    v
}

#[tokio::test]
async fn test_single_link_message_end_to_end() {
    let fake = FakeSyncServer::start(EMAIL, PASSWORD).await;
    let articles = Arc::new(StubArticles::returning(
        "An Example Article",
        "Some **markdown** body",
    ));
    let orchestrator = orchestrator(&fake, PASSWORD, articles.clone());

    let message = owner_message(
        "Check this out #cool https://example.com/article",
        vec![MessageEntity::new("hashtag", 15, 5)],
    );
    let reply = orchestrator.handle_message(&message).await.unwrap();

    assert_eq!(articles.calls(), vec!["https://example.com/article"]);

    let id = filed_note_id(&fake);
    let note = fake.note(id).unwrap();
    assert_eq!(note.title, "An Example Article");
    assert!(note
        .text
        .starts_with("Original: https://example.com/article\n\nSome **markdown** body"));

    assert_eq!(
        sorted(fake.tag_titles()),
        vec!["inbox", "links", "telegram", "telegram.cool"]
    );
    for tag in ["telegram", "inbox", "links", "telegram.cool"] {
        assert_eq!(fake.tag_references(tag), Some(vec![id]), "tag {}", tag);
        assert!(reply.contains(&format!("#{} ", tag)), "reply lists {}", tag);
    }
    assert!(reply.contains("«An Example Article»"));
    assert_eq!(fake.sign_out_count(), 1);
}

#[tokio::test]
async fn test_message_without_links_gets_no_links_tag() {
    let fake = FakeSyncServer::start(EMAIL, PASSWORD).await;
    let articles = Arc::new(StubArticles::returning("unused", "unused"));
    let orchestrator = orchestrator(&fake, PASSWORD, articles.clone());

    let message = owner_message(
        "just a thought #idea",
        vec![MessageEntity::new("hashtag", 15, 5)],
    );
    let reply = orchestrator.handle_message(&message).await.unwrap();

    assert!(articles.calls().is_empty());
    assert_eq!(
        sorted(fake.tag_titles()),
        vec!["inbox", "telegram", "telegram.idea"]
    );
    assert!(fake.tag_references("links").is_none());

    let note = fake.note(filed_note_id(&fake)).unwrap();
    assert_eq!(note.title, "");
    assert_eq!(note.text, "just a thought #idea");
    assert!(!reply.contains("#links"));
}

#[tokio::test]
async fn test_hashtag_after_emoji_becomes_tag() {
    let fake = FakeSyncServer::start(EMAIL, PASSWORD).await;
    let orchestrator = orchestrator(
        &fake,
        PASSWORD,
        Arc::new(StubArticles::returning("unused", "unused")),
    );

    // Two astral-plane emoji and a space: five UTF-16 units before '#'.
    let message = owner_message(
        "🎉🎉 #party time",
        vec![MessageEntity::new("hashtag", 5, 6)],
    );
    orchestrator.handle_message(&message).await.unwrap();

    assert_eq!(fake.tag_count("telegram.party"), 1);
}

#[tokio::test]
async fn test_several_links_are_not_expanded() {
    let fake = FakeSyncServer::start(EMAIL, PASSWORD).await;
    let articles = Arc::new(StubArticles::returning("unused", "unused"));
    let orchestrator = orchestrator(&fake, PASSWORD, articles.clone());

    let text = "compare https://a.example.com/x and https://b.example.com/y";
    orchestrator
        .handle_message(&owner_message(text, vec![]))
        .await
        .unwrap();

    assert!(articles.calls().is_empty());
    assert_eq!(fake.tag_count("links"), 1);
    assert_eq!(fake.note(filed_note_id(&fake)).unwrap().text, text);
}

#[tokio::test]
async fn test_forwarded_message_title() {
    let fake = FakeSyncServer::start(EMAIL, PASSWORD).await;
    let orchestrator = orchestrator(
        &fake,
        PASSWORD,
        Arc::new(StubArticles::returning("unused", "unused")),
    );

    let mut message = owner_message("forwarded post", vec![]);
    message.forward_from_chat = Some(notebridge_bot::Chat {
        id: -1001,
        title: Some("Rust Weekly".to_string()),
    });
    message.forward_from_message_id = Some(512);
    let reply = orchestrator.handle_message(&message).await.unwrap();

    let note = fake.note(filed_note_id(&fake)).unwrap();
    assert_eq!(note.title, "Rust Weekly #512");
    assert!(reply.starts_with("Note *«Rust Weekly #512»* created"));
}

#[tokio::test]
async fn test_wrong_password_creates_nothing() {
    let fake = FakeSyncServer::start(EMAIL, PASSWORD).await;
    let articles = Arc::new(StubArticles::returning("unused", "unused"));
    let orchestrator = orchestrator(&fake, "not the password", articles.clone());

    let err = orchestrator
        .handle_message(&owner_message("hello https://example.com", vec![]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(err.to_string().starts_with("Authentication error: login:"));
    assert_eq!(fake.note_count(), 0);
    assert!(articles.calls().is_empty());
}

#[tokio::test]
async fn test_extraction_failure_aborts_and_still_logs_out() {
    let fake = FakeSyncServer::start(EMAIL, PASSWORD).await;
    let articles = Arc::new(StubArticles::failing(ExtractionError::Timeout(
        "https://slow.example.com".to_string(),
    )));
    let orchestrator = orchestrator(&fake, PASSWORD, articles.clone());

    let err = orchestrator
        .handle_message(&owner_message("read https://slow.example.com", vec![]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Extraction);
    assert_eq!(
        err.to_string(),
        "Extraction error: timed out: https://slow.example.com"
    );
    assert_eq!(fake.note_count(), 0);
    assert_eq!(fake.push_count(), 0);
    assert_eq!(fake.sign_out_count(), 1);
}

#[tokio::test]
async fn test_each_message_gets_its_own_session() {
    let fake = FakeSyncServer::start(EMAIL, PASSWORD).await;
    let orchestrator = orchestrator(
        &fake,
        PASSWORD,
        Arc::new(StubArticles::returning("unused", "unused")),
    );

    orchestrator
        .handle_message(&owner_message("first", vec![]))
        .await
        .unwrap();
    orchestrator
        .handle_message(&owner_message("second", vec![]))
        .await
        .unwrap();

    assert_eq!(fake.note_count(), 2);
    assert_eq!(fake.sign_out_count(), 2);
    // Both notes share the base tags, each tag stored once.
    assert_eq!(fake.tag_count("inbox"), 1);
    assert_eq!(fake.tag_references("inbox").map(|r| r.len()), Some(2));
}
