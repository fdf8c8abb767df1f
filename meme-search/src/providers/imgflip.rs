//! Imgflip provider: the public meme template catalogue.
//!
//! `get_memes` has no search parameter, so the full list is fetched and
//! filtered locally against the query words.

use serde::Deserialize;

use crate::config::SearchConfig;
use crate::error::MemeError;
use crate::http;
use crate::provider::MemeProvider;
use crate::types::{ContentType, MediaResult, ProviderKind};

/// Query words too generic to match template names on.
const GENERIC_WORDS: &[&str] = &["meme", "memes", "anime", "funny"];

/// Imgflip template search.
pub struct ImgflipProvider {
    agent: ureq::Agent,
    base_url: String,
}

impl ImgflipProvider {
    /// Create a provider using the endpoint from `config`.
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            agent: http::build_agent(config),
            base_url: config.imgflip_base_url.clone(),
        }
    }
}

impl MemeProvider for ImgflipProvider {
    fn fetch(&self, query: &str, limit: usize) -> Result<Vec<MediaResult>, MemeError> {
        let url = format!("{}/get_memes", self.base_url.trim_end_matches('/'));
        let response: GetMemesResponse = http::get_json(self.agent.get(&url), "Imgflip")?;
        if !response.success {
            return Err(MemeError::ProviderUnavailable(format!(
                "Imgflip: request rejected: {}",
                response.error_message.unwrap_or_default()
            )));
        }
        Ok(filter_templates(response.data.memes, query, limit))
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Imgflip
    }
}

#[derive(Debug, Deserialize)]
struct GetMemesResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: TemplateList,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TemplateList {
    #[serde(default)]
    memes: Vec<Template>,
}

#[derive(Debug, Deserialize)]
struct Template {
    name: String,
    url: String,
}

/// Keep templates whose name contains one of the meaningful query words.
fn filter_templates(templates: Vec<Template>, query: &str, limit: usize) -> Vec<MediaResult> {
    let query = query.to_lowercase();
    let words: Vec<&str> = query
        .split_whitespace()
        .filter(|w| w.len() > 2 && !GENERIC_WORDS.contains(w))
        .collect();
    if words.is_empty() {
        return Vec::new();
    }

    templates
        .into_iter()
        .filter(|t| !t.url.is_empty())
        .filter(|t| {
            let name = t.name.to_lowercase();
            words.iter().any(|w| name.contains(w))
        })
        .take(limit)
        .map(|t| {
            let content_type = ContentType::from_url(&t.url);
            MediaResult::new(t.name, "Imgflip", content_type, t.url, ["imgflip", "template"])
        })
        .collect()
}
