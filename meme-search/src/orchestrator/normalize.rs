//! Query normalisation: hashtag extraction and keyword cleanup.
//!
//! Turns free text such as `"The Tanjiro memes #kny #tanjiro!"` into a
//! canonical base query (`"tanjiro memes"`) plus the ordered hashtag set
//! (`["kny", "tanjiro"]`).

use std::sync::LazyLock;

use regex::Regex;

use crate::error::MemeError;

// SAFETY: the pattern is a compile-time constant known to be valid
#[allow(clippy::unwrap_used)]
static HASHTAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#(\w+)").unwrap());

/// Words dropped from the base query.
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "of", "for", "in", "on", "at", "by", "with", "about",
];

/// Franchise terms moved to the front of the base query.
const PRIORITY_KEYWORDS: &[&str] = &[
    "tanjiro", "nezuko", "zenitsu", "inosuke", "muzan", "hashira", "giyu", "rengoku",
    "shinobu", "demon", "slayer", "kimetsu",
];

/// A query after normalisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery {
    /// Canonical search text. Never empty.
    pub base: String,
    /// Hashtags without `#`, in first-seen order, without duplicates.
    pub hashtags: Vec<String>,
}

/// Normalise a raw user query.
///
/// # Errors
///
/// Returns [`MemeError::EmptyQuery`] if the input is empty or whitespace.
pub fn normalize(raw: &str) -> Result<NormalizedQuery, MemeError> {
    let lowered = raw.trim().to_lowercase();
    if lowered.is_empty() {
        return Err(MemeError::EmptyQuery);
    }

    let mut hashtags: Vec<String> = Vec::new();
    for capture in HASHTAG.captures_iter(&lowered) {
        let tag = &capture[1];
        if !hashtags.iter().any(|t| t == tag) {
            hashtags.push(tag.to_owned());
        }
    }

    let stripped = HASHTAG.replace_all(&lowered, " ");
    let mut text = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty()
        && let Some(first) = hashtags.first()
    {
        text.clone_from(first);
    }

    let cleaned: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();

    let tokens: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|token| token.chars().count() > 2 && !STOPWORDS.contains(token))
        .collect();

    let (mut ordered, rest): (Vec<&str>, Vec<&str>) = tokens
        .into_iter()
        .partition(|token| PRIORITY_KEYWORDS.contains(token));
    ordered.extend(rest);

    let base = if ordered.is_empty() {
        lowered
    } else {
        ordered.join(" ")
    };

    tracing::trace!(raw, %base, ?hashtags, "normalized query");
    Ok(NormalizedQuery { base, hashtags })
}
