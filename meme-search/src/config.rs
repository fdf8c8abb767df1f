//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] controls which providers are queried and in what order,
//! timeouts, over-fetching, and the provider endpoints. It is serde-friendly
//! so applications can embed it as a section of their own TOML config.

use serde::{Deserialize, Serialize};

use crate::error::MemeError;
use crate::types::ProviderKind;

/// Configuration for meme searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Providers to query, in priority order. Queried sequentially.
    pub providers: Vec<ProviderKind>,
    /// Result count used when a caller does not pass its own limit.
    pub default_limit: usize,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Minimum number of items requested from a provider per call.
    pub search_floor: usize,
    /// Multiplier applied to the limit before asking a provider, to make
    /// up for entries dropped by post-filtering.
    pub overfetch_factor: usize,
    /// Extra multiplier the primary provider applies per subreddit.
    pub primary_fetch_multiplier: usize,
    /// Subreddits searched by the primary provider, in priority order.
    pub subreddits: Vec<String>,
    /// Ask providers to filter adult content and skip NSFW posts.
    pub safe_search: bool,
    /// Custom User-Agent string. If `None`, rotates through a built-in list
    /// of realistic browser User-Agents.
    pub user_agent: Option<String>,
    /// Public Tenor API key. The Tenor provider is skipped when unset.
    pub tenor_api_key: Option<String>,
    /// Query tried when nothing was found for a franchise subject.
    pub franchise_fallback_query: String,
    /// Reddit endpoint root.
    pub reddit_base_url: String,
    /// Tenor endpoint root.
    pub tenor_base_url: String,
    /// Imgflip endpoint root.
    pub imgflip_base_url: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            providers: ProviderKind::all().to_vec(),
            default_limit: 5,
            timeout_seconds: 12,
            search_floor: 10,
            overfetch_factor: 3,
            primary_fetch_multiplier: 2,
            subreddits: vec![
                "KimetsuNoYaiba".to_owned(),
                "DemonSlayerAnime".to_owned(),
                "Animemes".to_owned(),
                "animememes".to_owned(),
                "memes".to_owned(),
            ],
            safe_search: true,
            user_agent: None,
            tenor_api_key: None,
            franchise_fallback_query: "demon slayer meme".to_owned(),
            reddit_base_url: "https://www.reddit.com".to_owned(),
            tenor_base_url: "https://tenor.googleapis.com".to_owned(),
            imgflip_base_url: "https://api.imgflip.com".to_owned(),
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `default_limit`, `timeout_seconds`, `search_floor` must be greater than 0
    /// - `overfetch_factor` and `primary_fetch_multiplier` must be at least 1
    /// - `providers` must not be empty
    /// - `subreddits` must not be empty when Reddit is enabled
    pub fn validate(&self) -> Result<(), MemeError> {
        if self.default_limit == 0 {
            return Err(MemeError::Config(
                "default_limit must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(MemeError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.search_floor == 0 {
            return Err(MemeError::Config(
                "search_floor must be greater than 0".into(),
            ));
        }
        if self.overfetch_factor == 0 || self.primary_fetch_multiplier == 0 {
            return Err(MemeError::Config(
                "overfetch_factor and primary_fetch_multiplier must be at least 1".into(),
            ));
        }
        if self.providers.is_empty() {
            return Err(MemeError::Config(
                "at least one provider must be enabled".into(),
            ));
        }
        if self.providers.contains(&ProviderKind::Reddit) && self.subreddits.is_empty() {
            return Err(MemeError::Config(
                "reddit provider needs at least one subreddit".into(),
            ));
        }
        Ok(())
    }

    /// Number of items to request from a provider for a caller `limit`:
    /// `max(search_floor, limit * overfetch_factor)`.
    pub fn request_size(&self, limit: usize) -> usize {
        self.search_floor
            .max(limit.saturating_mul(self.overfetch_factor))
    }
}
