//! Reddit provider: subreddit search through the public JSON API.
//!
//! The primary and most reliable source. Several subreddits are searched in
//! a fixed priority order; each request over-fetches by
//! `primary_fetch_multiplier` because a large share of posts are self
//! posts, videos or previews on hosts that refuse hot-linking.

use std::collections::HashSet;

use serde::Deserialize;

use crate::config::SearchConfig;
use crate::error::MemeError;
use crate::http;
use crate::media_url::{is_image_url, is_valid_media_url, unescape_html_url};
use crate::provider::MemeProvider;
use crate::types::{ContentType, MediaResult, ProviderKind};

/// Reddit rejects `limit` above this value.
const MAX_PAGE_SIZE: usize = 100;

/// Reddit subreddit search.
pub struct RedditProvider {
    agent: ureq::Agent,
    config: SearchConfig,
}

impl RedditProvider {
    /// Create a provider using the subreddits and endpoint from `config`.
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            agent: http::build_agent(config),
            config: config.clone(),
        }
    }

    fn page_size(&self, limit: usize) -> usize {
        self.config
            .request_size(limit)
            .saturating_mul(self.config.primary_fetch_multiplier)
            .min(MAX_PAGE_SIZE)
    }
}

impl MemeProvider for RedditProvider {
    fn fetch(&self, query: &str, limit: usize) -> Result<Vec<MediaResult>, MemeError> {
        let page_size = self.page_size(limit).to_string();
        let base = self.config.reddit_base_url.trim_end_matches('/');
        let over_18 = if self.config.safe_search { "off" } else { "on" };

        let mut results: Vec<MediaResult> = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut failures = Vec::new();

        for subreddit in &self.config.subreddits {
            if results.len() >= limit {
                break;
            }
            let label = format!("Reddit r/{subreddit}");
            let request = self
                .agent
                .get(&format!("{base}/r/{subreddit}/search.json"))
                .query("q", query)
                .query("restrict_sr", "1")
                .query("sort", "relevance")
                .query("limit", &page_size)
                .query("include_over_18", over_18);

            match http::get_json::<Listing>(request, &label) {
                Ok(listing) => {
                    let mapped = map_listing(listing, subreddit, self.config.safe_search);
                    tracing::debug!(subreddit, count = mapped.len(), "subreddit results mapped");
                    // Crossposts repeat across subreddits; only new identities count.
                    results.extend(mapped.into_iter().filter(|r| {
                        seen.insert((r.title.clone(), r.locator.clone()))
                    }));
                }
                Err(e) => {
                    tracing::debug!(subreddit, error = %e, "subreddit search failed");
                    failures.push(e.to_string());
                }
            }
        }

        if results.is_empty() && failures.len() == self.config.subreddits.len() && !failures.is_empty() {
            return Err(MemeError::ProviderUnavailable(failures.join("; ")));
        }
        Ok(results)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Reddit
    }
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    is_self: bool,
    #[serde(default)]
    is_video: bool,
    #[serde(default)]
    over_18: bool,
    #[serde(default)]
    link_flair_text: Option<String>,
    #[serde(default)]
    preview: Option<Preview>,
}

#[derive(Debug, Deserialize)]
struct Preview {
    #[serde(default)]
    images: Vec<PreviewImage>,
}

#[derive(Debug, Deserialize)]
struct PreviewImage {
    source: PreviewSource,
}

#[derive(Debug, Deserialize)]
struct PreviewSource {
    url: String,
}

fn map_listing(listing: Listing, subreddit: &str, safe_search: bool) -> Vec<MediaResult> {
    listing
        .data
        .children
        .into_iter()
        .filter_map(|child| map_post(child.data, subreddit, safe_search))
        .collect()
}

/// Map one post to a result, or `None` for posts that cannot be displayed.
fn map_post(post: Post, subreddit: &str, safe_search: bool) -> Option<MediaResult> {
    if post.is_self || post.is_video || (safe_search && post.over_18) {
        return None;
    }

    let direct = post.url.filter(|u| is_image_url(u));
    let url = match direct {
        Some(url) => url,
        None => post
            .preview?
            .images
            .into_iter()
            .next()
            .map(|image| unescape_html_url(&image.source.url))?,
    };

    if !is_valid_media_url(&url) {
        tracing::trace!(%url, "skipping blocked media host");
        return None;
    }

    let title = match post.title.trim() {
        "" => format!("Reddit meme from r/{subreddit}"),
        t => t.to_owned(),
    };
    let mut tags = vec![subreddit.to_owned()];
    tags.extend(post.link_flair_text);

    Some(MediaResult::new(
        title,
        format!("Reddit r/{subreddit}"),
        ContentType::from_url(&url),
        url,
        tags,
    ))
}
