//! One chat session: command dispatch and per-session state.
//!
//! A [`Session`] owns everything a conversation needs (meme searcher, media
//! cache, conversation memory, persona) plus the meme-browsing cursor. Front
//! ends feed it raw lines through [`Session::handle`] and render the
//! returned [`Reply`].

use std::path::PathBuf;

use meme_search::media_url::canonicalize_media_url;
use meme_search::{ContentType, MediaCache, MediaResult, MemeSearcher, OverrideDb};
use tracing::{debug, info, warn};

use crate::config::BotConfig;
use crate::error::Result;
use crate::interests::{self, InterestAnalysis};
use crate::memory::{ConversationMemory, format_history};
use crate::persona::{FAREWELL, Persona};

/// Usage text for the curated-meme command.
pub const ADD_MEME_USAGE: &str = "Usage: add meme topic | title | source | type | url | tags";

const NO_MEMES_LOADED: &str = "No memes loaded yet. Try `meme <topic>` first.";

/// What a front end should show after a line of input.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Blank input; show nothing.
    Nothing,
    /// Plain reply text.
    Text(String),
    /// A meme from the current result list.
    Meme(MemeCard),
    /// The transcript was reset; the front end may clear the screen.
    Cleared,
    /// The user is leaving; show the farewell and stop.
    Exit(String),
}

impl Reply {
    /// Text form of the reply, as printed by the CLI.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Nothing | Self::Cleared => String::new(),
            Self::Text(text) | Self::Exit(text) => text.clone(),
            Self::Meme(card) => card.render(),
        }
    }
}

/// A meme ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct MemeCard {
    /// Display label.
    pub title: String,
    /// Provenance.
    pub source: String,
    /// How `body`, `local_path` and `remote_url` should be used.
    pub content_type: ContentType,
    /// 1-based position in the current result list.
    pub position: usize,
    /// Length of the current result list.
    pub total: usize,
    /// The text of a text meme.
    pub body: Option<String>,
    /// Cached copy of an image or GIF.
    pub local_path: Option<PathBuf>,
    /// Canonical remote URL of an image or GIF.
    pub remote_url: Option<String>,
}

impl MemeCard {
    /// Markdown-ish rendering: title, source, then the text, cached path or URL.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!("**{}**\nSource: {}", self.title, self.source);
        if self.total > 1 {
            out.push_str(&format!(" ({}/{})", self.position, self.total));
        }
        if let Some(body) = &self.body {
            out.push_str(&format!("\n{body}"));
        } else if let Some(path) = &self.local_path {
            out.push_str(&format!("\n{}", path.display()));
        } else if let Some(url) = &self.remote_url {
            out.push_str(&format!("\n{url}"));
        }
        out
    }
}

/// Parse `topic | title | source | type | url | tags` into a topic and record.
///
/// `tags` is optional and comma-separated. For text memes the `url` field
/// holds the meme text.
pub fn parse_add_meme(line: &str) -> std::result::Result<(String, MediaResult), String> {
    let fields: Vec<&str> = line.split('|').map(str::trim).collect();
    if fields.len() < 5 || fields.len() > 6 {
        return Err(ADD_MEME_USAGE.to_owned());
    }
    let (topic, title, source, kind, locator) = (fields[0], fields[1], fields[2], fields[3], fields[4]);
    if topic.is_empty() || title.is_empty() || locator.is_empty() {
        return Err(ADD_MEME_USAGE.to_owned());
    }
    let content_type = ContentType::parse(kind)
        .ok_or_else(|| format!("Unknown meme type '{kind}'. Use text, image or gif."))?;
    let source = if source.is_empty() { "Curated" } else { source };
    let tags = fields
        .get(5)
        .map(|t| t.split(',').collect::<Vec<_>>())
        .unwrap_or_default();
    Ok((
        topic.to_lowercase(),
        MediaResult::new(title, source, content_type, locator, tags),
    ))
}

/// Per-session chat state and command dispatcher.
pub struct Session {
    searcher: MemeSearcher,
    cache: Option<MediaCache>,
    memory: ConversationMemory,
    persona: Persona,
    transcript: Vec<(String, String)>,
    memes: Vec<MediaResult>,
    meme_index: usize,
    meme_topic: Option<String>,
}

impl Session {
    /// Assemble a session from its parts.
    pub fn new(
        searcher: MemeSearcher,
        cache: Option<MediaCache>,
        memory: ConversationMemory,
        persona: Persona,
    ) -> Self {
        Self {
            searcher,
            cache,
            memory,
            persona,
            transcript: Vec::new(),
            memes: Vec::new(),
            meme_index: 0,
            meme_topic: None,
        }
    }

    /// Build a session from configuration: override database, providers,
    /// media cache, conversation memory and chat backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the override
    /// database cannot be created.
    pub fn from_config(config: &BotConfig) -> Result<Self> {
        config.validate()?;

        let overrides_path = config.overrides_file();
        let overrides = OverrideDb::load_with(&overrides_path, config.overrides.seed_defaults)?;
        if !overrides.quarantined().is_empty() {
            warn!(
                count = overrides.quarantined().len(),
                "invalid curated memes were quarantined"
            );
        }
        info!(path = %overrides_path.display(), topics = overrides.len(), "override database loaded");

        let searcher = MemeSearcher::new(config.search.clone(), overrides.into_shared())?;
        let cache = config
            .cache
            .enabled
            .then(|| MediaCache::new(config.media_cache_dir(), config.cache.timeout_seconds));
        let memory = ConversationMemory::load(&config.memory_file(), config.memory.max_entries);
        let persona = Persona::from_config(&config.llm);

        Ok(Self::new(searcher, cache, memory, persona))
    }

    /// Conversation memory.
    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Mutable conversation memory.
    pub fn memory_mut(&mut self) -> &mut ConversationMemory {
        &mut self.memory
    }

    /// The meme searcher.
    pub fn searcher(&self) -> &MemeSearcher {
        &self.searcher
    }

    /// Exchanges shown this session, oldest first.
    pub fn transcript(&self) -> &[(String, String)] {
        &self.transcript
    }

    /// Results of the last `meme` command.
    pub fn current_memes(&self) -> &[MediaResult] {
        &self.memes
    }

    /// Topic of the last `meme` command.
    pub fn current_topic(&self) -> Option<&str> {
        self.meme_topic.as_deref()
    }

    /// Analyze interests over stored memory.
    pub fn interests(&self) -> InterestAnalysis {
        let entries = self.memory.recent(None);
        interests::analyze(
            &entries,
            self.persona.analysis_backend(),
            self.persona.analysis_options(),
        )
    }

    /// Dispatch one line of user input.
    pub fn handle(&mut self, input: &str) -> Reply {
        let input = input.trim();
        if input.is_empty() {
            return Reply::Nothing;
        }
        let lower = input.to_lowercase();

        let reply = match lower.as_str() {
            "exit" | "quit" => return Reply::Exit(FAREWELL.to_owned()),
            "clear" => {
                self.transcript.clear();
                return Reply::Cleared;
            }
            "history" => Reply::Text(format_history(&self.memory.recent(None))),
            "interests" => Reply::Text(interests::format_interests(&self.interests())),
            "next meme" => self.step_meme(true),
            "previous meme" | "prev meme" => self.step_meme(false),
            _ if lower.starts_with("add meme ") => {
                Reply::Text(self.add_meme(input.get(9..).unwrap_or("")))
            }
            _ if lower.starts_with("meme ") => self.search(input.get(5..).unwrap_or("")),
            _ => Reply::Text(self.chat(input)),
        };

        let shown = reply.render();
        if !shown.is_empty() {
            self.remember_exchange(input, shown);
        }
        reply
    }

    fn remember_exchange(&mut self, input: &str, shown: String) {
        self.transcript.push((input.to_owned(), shown));
        let excess = self
            .transcript
            .len()
            .saturating_sub(self.memory.max_entries());
        self.transcript.drain(..excess);
    }

    fn search(&mut self, raw_topic: &str) -> Reply {
        let topic = raw_topic.trim().trim_start_matches('#').to_owned();
        let limit = self.searcher.config().default_limit;
        debug!(topic = %topic, limit, "meme command");

        self.memes = self.searcher.search_memes(&topic, limit);
        self.meme_index = 0;
        self.meme_topic = Some(topic.clone());

        if self.memes.is_empty() {
            return Reply::Text(format!("No memes found for **{topic}**."));
        }
        Reply::Meme(self.card(0))
    }

    fn step_meme(&mut self, forward: bool) -> Reply {
        let total = self.memes.len();
        if total == 0 {
            return Reply::Text(NO_MEMES_LOADED.to_owned());
        }
        self.meme_index = if forward {
            (self.meme_index + 1) % total
        } else {
            (self.meme_index + total - 1) % total
        };
        Reply::Meme(self.card(self.meme_index))
    }

    fn card(&self, index: usize) -> MemeCard {
        let meme = &self.memes[index];
        let mut card = MemeCard {
            title: meme.title.clone(),
            source: meme.source.clone(),
            content_type: meme.content_type,
            position: index + 1,
            total: self.memes.len(),
            body: None,
            local_path: None,
            remote_url: None,
        };
        if meme.is_media() {
            let url = canonicalize_media_url(&meme.locator);
            card.local_path = self.cache.as_ref().and_then(|cache| cache.fetch(&url));
            card.remote_url = Some(url);
        } else {
            card.body = Some(meme.locator.clone());
        }
        card
    }

    fn add_meme(&self, line: &str) -> String {
        let (topic, meme) = match parse_add_meme(line) {
            Ok(parsed) => parsed,
            Err(usage) => return usage,
        };
        let title = meme.title.clone();
        match self.searcher.add_meme(&topic, meme) {
            Ok(()) => format!("Added **{title}** to the memes for **{topic}**."),
            Err(e) => {
                warn!(topic = %topic, error = %e, "could not add curated meme");
                format!("Couldn't add that meme: {e}")
            }
        }
    }

    fn chat(&mut self, input: &str) -> String {
        if let Err(e) = self.memory.record(input, None) {
            warn!(error = %e, "could not save conversation memory");
        }

        let context = interests::context_for_prompt(&self.interests());
        let reply = self.persona.respond(input, &self.transcript, &context);

        if let Err(e) = self.memory.complete_last(input, &reply) {
            warn!(error = %e, "could not save conversation memory");
        }
        reply
    }
}
