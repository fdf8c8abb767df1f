//! Integration tests for the chat session command dispatcher.
//!
//! Sessions are wired to an in-memory curated database and a scripted chat
//! backend, so nothing here touches the network except the media cache
//! test, which runs against a local mock server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};

use meme_search::providers::CuratedProvider;
use meme_search::{
    ContentType, MediaCache, MediaResult, MemeProvider, MemeSearcher, OverrideDb, SearchConfig,
    SharedOverrides,
};
use tanjiro::config::LlmConfig;
use tanjiro::llm::{ChatBackend, ChatMessage, CompletionOptions};
use tanjiro::memory::ConversationMemory;
use tanjiro::persona::{API_KEY_ERROR, FAREWELL, Persona};
use tanjiro::{Reply, Session};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

type Calls = Arc<Mutex<Vec<(Vec<ChatMessage>, CompletionOptions)>>>;

/// Answers analysis requests with fixed JSON and chat requests with a
/// numbered reply.
struct ScriptedBackend {
    calls: Calls,
}

impl ChatBackend for ScriptedBackend {
    fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> tanjiro::Result<String> {
        let mut calls = self.calls.lock().unwrap();
        calls.push((messages.to_vec(), options.clone()));
        if options.json_object {
            return Ok(r#"{"demon_slayer_topics": {"nezuko": 5}, "general_topics": {}, "summary": "Cares about Nezuko."}"#.into());
        }
        Ok(format!("Reply #{}", calls.len()))
    }
}

fn overrides_with(memes: &[(&str, MediaResult)]) -> SharedOverrides {
    let mut db = OverrideDb::in_memory();
    for (topic, meme) in memes {
        db.add(topic, meme.clone()).unwrap();
    }
    db.into_shared()
}

fn text_meme(title: &str, text: &str) -> MediaResult {
    MediaResult::new(title, "Curated", ContentType::Text, text, ["nezuko"])
}

fn session_with(
    overrides: SharedOverrides,
    cache: Option<MediaCache>,
    backend: Option<Box<dyn ChatBackend>>,
) -> Session {
    let provider: Box<dyn MemeProvider> = Box::new(CuratedProvider::new(Arc::clone(&overrides)));
    let searcher =
        MemeSearcher::with_providers(SearchConfig::default(), vec![provider], overrides).unwrap();
    let persona = Persona::new(backend, &LlmConfig::default());
    Session::new(searcher, cache, ConversationMemory::in_memory(10), persona)
}

fn scripted() -> (Option<Box<dyn ChatBackend>>, Calls) {
    let calls: Calls = Arc::default();
    let backend: Box<dyn ChatBackend> = Box::new(ScriptedBackend {
        calls: Arc::clone(&calls),
    });
    (Some(backend), calls)
}

fn meme_card(reply: Reply) -> tanjiro::session::MemeCard {
    match reply {
        Reply::Meme(card) => card,
        other => panic!("expected a meme, got {other:?}"),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Built-in commands
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn exit_and_quit_say_goodbye() {
    let mut session = session_with(overrides_with(&[]), None, None);
    assert_eq!(session.handle("exit"), Reply::Exit(FAREWELL.into()));
    assert_eq!(session.handle("  QUIT "), Reply::Exit(FAREWELL.into()));
}

#[test]
fn blank_input_is_ignored() {
    let mut session = session_with(overrides_with(&[]), None, None);
    assert_eq!(session.handle("   "), Reply::Nothing);
    assert!(session.transcript().is_empty());
    assert!(session.memory().is_empty());
}

#[test]
fn clear_resets_transcript_only() {
    let (backend, _) = scripted();
    let mut session = session_with(overrides_with(&[]), None, backend);
    session.handle("hello there");
    assert_eq!(session.transcript().len(), 1);

    assert_eq!(session.handle("clear"), Reply::Cleared);
    assert!(session.transcript().is_empty());
    assert_eq!(session.memory().len(), 1);
}

#[test]
fn history_lists_recorded_turns() {
    let (backend, _) = scripted();
    let mut session = session_with(overrides_with(&[]), None, backend);
    assert_eq!(
        session.handle("history"),
        Reply::Text("No conversation history available.".into())
    );

    session.handle("Tell me about your sister");
    let text = session.handle("history").render();
    assert!(text.contains("You: Tell me about your sister"));
    assert!(text.contains("Tanjiro: Reply #"));
}

#[test]
fn interests_without_backend_use_keywords() {
    let mut session = session_with(overrides_with(&[]), None, None);
    session.handle("I love Nezuko and water breathing");
    let text = session.handle("interests").render();
    assert!(text.contains("🔸 **Demon Slayer Topics**:"));
    assert!(text.contains("- nezuko: ★ (1)"));
    assert!(text.contains("- water breathing: ★ (1)"));
    assert!(text.contains("- love: ★ (1)"));
    assert!(text.contains("Analysis based on keyword matching only."));
}

// ────────────────────────────────────────────────────────────────────────────
// Chat turns
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn chat_records_turn_with_reply() {
    let (backend, _) = scripted();
    let mut session = session_with(overrides_with(&[]), None, backend);

    let reply = session.handle("How is Nezuko?");
    let Reply::Text(text) = reply else {
        panic!("expected text reply");
    };
    assert!(text.starts_with("Reply #"));

    let entries = session.memory().recent(None);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].user_input, "How is Nezuko?");
    assert_eq!(entries[0].response.as_deref(), Some(text.as_str()));
}

#[test]
fn chat_sends_interest_context_and_history() {
    let (backend, calls) = scripted();
    let mut session = session_with(overrides_with(&[]), None, backend);

    session.handle("Nezuko is the best");
    session.handle("What about training?");

    let calls = calls.lock().unwrap();
    // Each turn: one analysis request, then one reply request.
    assert_eq!(calls.len(), 4);
    assert!(calls[0].1.json_object);
    assert!(!calls[1].1.json_object);

    let (messages, _) = &calls[3];
    let system = &messages[0].content;
    assert!(system.starts_with("You are Kamado Tanjiro"));
    assert!(system.contains("The user has shown interest in these topics: nezuko."));
    assert!(system.contains("User context: Cares about Nezuko."));
    assert_eq!(messages[1], ChatMessage::user("Nezuko is the best"));
    assert_eq!(messages.last().unwrap(), &ChatMessage::user("What about training?"));
}

#[test]
fn chat_without_backend_reports_missing_key() {
    let mut session = session_with(overrides_with(&[]), None, None);
    assert_eq!(session.handle("hello"), Reply::Text(API_KEY_ERROR.into()));
    assert_eq!(
        session.memory().recent(None)[0].response.as_deref(),
        Some(API_KEY_ERROR)
    );
}

// ────────────────────────────────────────────────────────────────────────────
// Meme browsing
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn meme_command_shows_first_result() {
    let overrides = overrides_with(&[("nezuko", text_meme("Bamboo", "Mmmph!"))]);
    let mut session = session_with(overrides, None, None);

    let card = meme_card(session.handle("meme #nezuko"));
    assert_eq!(session.current_topic(), Some("nezuko"));
    assert_eq!(card.title, "Bamboo");
    assert_eq!(card.body.as_deref(), Some("Mmmph!"));
    assert_eq!((card.position, card.total), (1, 1));
    assert_eq!(card.render(), "**Bamboo**\nSource: Curated\nMmmph!");
}

#[test]
fn next_and_previous_wrap_around() {
    let overrides = overrides_with(&[
        ("nezuko", text_meme("One", "1")),
        ("nezuko", text_meme("Two", "2")),
        ("nezuko", text_meme("Three", "3")),
    ]);
    let mut session = session_with(overrides, None, None);

    let first = meme_card(session.handle("meme nezuko"));
    let titles: Vec<String> = session
        .current_memes()
        .iter()
        .map(|m| m.title.clone())
        .collect();
    assert_eq!(titles.len(), 3);
    assert_eq!(first.title, titles[0]);

    assert_eq!(meme_card(session.handle("next meme")).title, titles[1]);
    assert_eq!(meme_card(session.handle("next meme")).title, titles[2]);
    assert_eq!(meme_card(session.handle("next meme")).title, titles[0]);
    let back = meme_card(session.handle("previous meme"));
    assert_eq!(back.title, titles[2]);
    assert_eq!((back.position, back.total), (3, 3));
}

#[test]
fn no_results_and_no_list() {
    let mut session = session_with(overrides_with(&[]), None, None);
    assert_eq!(
        session.handle("next meme").render(),
        "No memes loaded yet. Try `meme <topic>` first."
    );
    assert_eq!(
        session.handle("meme kokushibo").render(),
        "No memes found for **kokushibo**."
    );
    assert!(session.current_memes().is_empty());
}

#[test]
fn image_without_cache_shows_canonical_url() {
    let meme = MediaResult::new(
        "Preview",
        "Curated",
        ContentType::Image,
        "https://preview.redd.it/abc123.png?width=640&s=sig",
        ["nezuko"],
    );
    let mut session = session_with(overrides_with(&[("nezuko", meme)]), None, None);

    let card = meme_card(session.handle("meme nezuko"));
    assert_eq!(card.remote_url.as_deref(), Some("https://i.redd.it/abc123.png"));
    assert!(card.local_path.is_none());
}

#[test]
fn add_meme_then_find_it() {
    let mut session = session_with(overrides_with(&[]), None, None);
    let reply = session
        .handle("add meme Zenitsu | Sleeping thunder | Fan club | text | Thunder Breathing, First Form! | thunder, sleep");
    assert_eq!(
        reply.render(),
        "Added **Sleeping thunder** to the memes for **zenitsu**."
    );

    let card = meme_card(session.handle("meme zenitsu"));
    assert_eq!(card.title, "Sleeping thunder");
    assert_eq!(card.source, "Fan club");
}

#[test]
fn add_meme_reports_usage_and_invalid_records() {
    let mut session = session_with(overrides_with(&[]), None, None);
    assert!(session
        .handle("add meme just | three | parts")
        .render()
        .starts_with("Usage: add meme"));
    assert!(session
        .handle("add meme tanjiro | Bad | x | image | not a url")
        .render()
        .starts_with("Couldn't add that meme:"));
}

#[test]
fn add_meme_persists_to_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("meme_database.json");
    let overrides = OverrideDb::load(&db_path).unwrap().into_shared();
    let mut session = session_with(overrides, None, None);

    session.handle("add meme inosuke | Boar head | Curated | gif | https://media.tenor.com/boar.gif | boar");

    let reloaded = OverrideDb::load(&db_path).unwrap();
    let stored = reloaded.get("inosuke");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].content_type, ContentType::Gif);
    assert_eq!(stored[0].locator, "https://media.tenor.com/boar.gif");
}

#[tokio::test(flavor = "multi_thread")]
async fn image_memes_are_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nezuko.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G']))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache_dir = dir.path().join("image_cache");
    let url = format!("{}/nezuko.png", server.uri());
    let meme = MediaResult::new("Cached", "Curated", ContentType::Image, url.clone(), ["nezuko"]);
    let overrides = overrides_with(&[("nezuko", meme)]);

    let (first, second) = tokio::task::spawn_blocking(move || {
        let cache = MediaCache::new(cache_dir, 5);
        let mut session = session_with(overrides, Some(cache), None);
        let first = meme_card(session.handle("meme nezuko"));
        let second = meme_card(session.handle("next meme"));
        (first, second)
    })
    .await
    .unwrap();

    let local = first.local_path.expect("cached copy");
    assert!(local.exists());
    assert_eq!(std::fs::read(&local).unwrap(), vec![0x89, b'P', b'N', b'G']);
    assert_eq!(second.local_path.as_deref(), Some(local.as_path()));
    assert_eq!(first.remote_url.as_deref(), Some(url.as_str()));
}
