//! Strategy planning: expand one normalised query into candidate searches.
//!
//! Broad, cheap strategies come first; compound hashtag strategies come
//! last and are only reached when the simple ones under-deliver.

use super::normalize::NormalizedQuery;

/// Hashtags naming the franchise or medium.
const DOMAIN_TAGS: &[&str] = &["demonslayer", "kny", "kimetsunoyaiba", "anime", "manga"];

/// Hashtags naming a character.
const CHARACTER_TAGS: &[&str] = &[
    "tanjiro", "nezuko", "zenitsu", "inosuke", "giyu", "rengoku", "shinobu", "muzan",
];

/// Build the ordered, duplicate-free list of strategy strings.
///
/// `raw` is the caller's original topic and is only used as a last resort
/// when nothing else could be planned.
pub fn plan(query: &NormalizedQuery, raw: &str) -> Vec<String> {
    let mut strategies: Vec<String> = Vec::new();
    let mut push = |s: String| {
        if !s.is_empty() && !strategies.contains(&s) {
            strategies.push(s);
        }
    };

    push(query.base.clone());

    for tag in &query.hashtags {
        push(tag.clone());
    }

    if !query.base.is_empty() {
        for tag in query.hashtags.iter().filter(|t| **t != query.base) {
            push(format!("{} {tag}", query.base));
        }
    }

    for domain in query.hashtags.iter().filter(|t| DOMAIN_TAGS.contains(&t.as_str())) {
        for character in query
            .hashtags
            .iter()
            .filter(|t| CHARACTER_TAGS.contains(&t.as_str()))
        {
            push(format!("{domain} {character}"));
        }
    }

    if strategies.is_empty() {
        let cleaned = raw.trim().to_lowercase();
        if !cleaned.is_empty() {
            strategies.push(cleaned);
        }
    }

    tracing::debug!(count = strategies.len(), "planned search strategies");
    strategies
}
