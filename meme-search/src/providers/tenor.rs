//! Tenor provider: GIF search through the v2 API.
//!
//! Needs a public API key. [`build_providers`](super::build_providers)
//! leaves Tenor out when no key is configured.

use serde::Deserialize;

use crate::config::SearchConfig;
use crate::error::MemeError;
use crate::http;
use crate::provider::MemeProvider;
use crate::types::{ContentType, MediaResult, ProviderKind};

/// Tenor caps `limit` at 50.
const MAX_PAGE_SIZE: usize = 50;

/// Tenor GIF search.
pub struct TenorProvider {
    agent: ureq::Agent,
    api_key: String,
    config: SearchConfig,
}

impl TenorProvider {
    /// Create a provider with an explicit API key.
    pub fn new(config: &SearchConfig, api_key: impl Into<String>) -> Self {
        Self {
            agent: http::build_agent(config),
            api_key: api_key.into(),
            config: config.clone(),
        }
    }
}

impl MemeProvider for TenorProvider {
    fn fetch(&self, query: &str, limit: usize) -> Result<Vec<MediaResult>, MemeError> {
        let page_size = self.config.request_size(limit).min(MAX_PAGE_SIZE).to_string();
        let filter = if self.config.safe_search { "medium" } else { "off" };
        let url = format!("{}/v2/search", self.config.tenor_base_url.trim_end_matches('/'));

        let request = self
            .agent
            .get(&url)
            .query("q", query)
            .query("key", &self.api_key)
            .query("limit", &page_size)
            .query("contentfilter", filter)
            .query("media_filter", "gif");

        let response: SearchResponse = http::get_json(request, "Tenor")?;
        Ok(map_response(response))
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Tenor
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<TenorResult>,
}

#[derive(Debug, Deserialize)]
struct TenorResult {
    #[serde(default)]
    content_description: String,
    #[serde(default)]
    media_formats: MediaFormats,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MediaFormats {
    gif: Option<MediaFormat>,
}

#[derive(Debug, Deserialize)]
struct MediaFormat {
    url: String,
}

fn map_response(response: SearchResponse) -> Vec<MediaResult> {
    response
        .results
        .into_iter()
        .filter_map(|item| {
            let url = item.media_formats.gif?.url;
            if url.is_empty() {
                return None;
            }
            let title = match item.content_description.trim() {
                "" => "Tenor GIF".to_owned(),
                t => t.to_owned(),
            };
            let mut tags = item.tags;
            tags.push("gif".to_owned());
            Some(MediaResult::new(title, "Tenor", ContentType::Gif, url, tags))
        })
        .collect()
}
