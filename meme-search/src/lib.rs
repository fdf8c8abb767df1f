//! # meme-search
//!
//! Multi-source meme retrieval for the Tanjiro character bot.
//!
//! Turns a loosely structured query (free text plus optional `#hashtags`)
//! into a short, deduplicated, shuffled list of displayable memes by
//! querying several unreliable public content sources one after another.
//!
//! ## Design
//!
//! - Providers: a curated local override database, Reddit (primary),
//!   Tenor and Imgflip, each behind the [`MemeProvider`] trait
//! - Query normalisation and strategy planning widen or narrow the search
//!   depending on the hashtags present
//! - Sequential, blocking I/O with a bounded timeout per request
//! - Graceful degradation: a failing provider contributes nothing and the
//!   search moves on; "nothing found" is an empty list, never an error
//! - A content-addressed [`MediaCache`] for downloaded images and GIFs
//!
//! ## Example
//!
//! ```no_run
//! use meme_search::{MemeSearcher, SearchConfig, overrides::OverrideDb};
//!
//! # fn main() -> meme_search::Result<()> {
//! let overrides = OverrideDb::load(std::path::Path::new("meme_database.json"))?.into_shared();
//! let searcher = MemeSearcher::new(SearchConfig::default(), overrides)?;
//! for meme in searcher.search_memes("nezuko #kny", 5) {
//!     println!("{} ({})", meme.title, meme.source);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod media_url;
pub mod orchestrator;
pub mod overrides;
pub mod provider;
pub mod providers;
pub mod types;

pub use cache::MediaCache;
pub use config::SearchConfig;
pub use error::{MemeError, Result};
pub use overrides::{OverrideDb, SharedOverrides};
pub use provider::MemeProvider;
pub use types::{ContentType, MediaResult, ProviderKind};

/// Search context: configuration, providers and the override database.
///
/// Owned by the caller (one per session); there is no process-wide state.
pub struct MemeSearcher {
    config: SearchConfig,
    providers: Vec<Box<dyn MemeProvider>>,
    overrides: SharedOverrides,
}

impl MemeSearcher {
    /// Build a searcher with the providers listed in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::Config`] if the configuration is invalid.
    pub fn new(config: SearchConfig, overrides: SharedOverrides) -> Result<Self> {
        config.validate()?;
        let providers = providers::build_providers(&config, &overrides);
        tracing::debug!(
            providers = ?providers.iter().map(|p| p.kind()).collect::<Vec<_>>(),
            "meme searcher ready"
        );
        Ok(Self {
            config,
            providers,
            overrides,
        })
    }

    /// Build a searcher around an explicit provider list.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::Config`] if the configuration is invalid.
    pub fn with_providers(
        config: SearchConfig,
        providers: Vec<Box<dyn MemeProvider>>,
        overrides: SharedOverrides,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            providers,
            overrides,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The shared override database.
    pub fn overrides(&self) -> &SharedOverrides {
        &self.overrides
    }

    /// Search for up to `limit` memes. Never fails.
    ///
    /// An empty list means nothing was found, or the query was blank.
    pub fn search_memes(&self, topic: &str, limit: usize) -> Vec<MediaResult> {
        match self.try_search(topic, limit) {
            Ok(results) => results,
            Err(MemeError::EmptyQuery) => Vec::new(),
            Err(e) => {
                tracing::debug!(topic, reason = %e, "meme search returned nothing");
                Vec::new()
            }
        }
    }

    /// Search for up to `limit` memes, reporting why nothing came back.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::EmptyQuery`] for blank input and
    /// [`MemeError::NoResultsFound`] when all strategies came back empty.
    pub fn try_search(&self, topic: &str, limit: usize) -> Result<Vec<MediaResult>> {
        orchestrator::search::orchestrate_search(&self.providers, &self.config, topic, limit)
    }

    /// Find one meme and format it for display.
    ///
    /// Returns `(text, None)` for text memes and for the not-found message,
    /// and `(caption, Some(url))` for images and GIFs.
    pub fn get_related_meme(&self, topic: &str) -> (String, Option<String>) {
        let memes = self.search_memes(topic, 1);
        match memes.first() {
            Some(meme) => format_for_display(meme),
            None => (format!("I couldn't find any memes related to '{topic}'"), None),
        }
    }

    /// Add a curated meme to the override database and persist it.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::Database`] for invalid records or a poisoned
    /// lock, and I/O errors from the write.
    pub fn add_meme(&self, topic: &str, meme: MediaResult) -> Result<()> {
        let mut db = self
            .overrides
            .write()
            .map_err(|_| MemeError::Database("override database lock poisoned".into()))?;
        db.add(topic, meme)?;
        tracing::info!(topic, "curated meme added");
        Ok(())
    }
}

/// Format one meme as `(text, optional media url)`.
pub fn format_for_display(meme: &MediaResult) -> (String, Option<String>) {
    match meme.content_type {
        ContentType::Text => (format!("📝 **{}**: {}", meme.title, meme.locator), None),
        ContentType::Image | ContentType::Gif => {
            (format!("🖼️ **{}**", meme.title), Some(meme.locator.clone()))
        }
    }
}
