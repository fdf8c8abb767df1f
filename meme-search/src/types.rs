//! Core types for meme results and provider identification.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// How a [`MediaResult`] should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// The locator is the meme text itself.
    Text,
    /// The locator is a URL to a static image.
    Image,
    /// The locator is a URL to an animated GIF.
    Gif,
}

impl ContentType {
    /// Returns the lowercase name used in the override database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Gif => "gif",
        }
    }

    /// Parse a user-supplied content type name (case-insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "image" | "img" | "jpg" | "jpeg" | "png" => Some(Self::Image),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Guess the content type of a media URL from its extension.
    ///
    /// Anything that is not a GIF is treated as a static image.
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
        if path.ends_with(".gif") {
            Self::Gif
        } else {
            Self::Image
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single discovered meme.
///
/// Two results with the same `(title, locator)` pair are the same item,
/// whichever provider produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaResult {
    /// Display label.
    pub title: String,
    /// Human-readable provenance, e.g. `Reddit r/Animemes`.
    pub source: String,
    /// Rendering path for `locator`.
    pub content_type: ContentType,
    /// Literal text for [`ContentType::Text`], otherwise a URL.
    #[serde(rename = "url", alias = "content")]
    pub locator: String,
    /// Lowercase keywords.
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl MediaResult {
    /// Build a result, lowercasing and trimming every tag.
    pub fn new<I, S>(
        title: impl Into<String>,
        source: impl Into<String>,
        content_type: ContentType,
        locator: impl Into<String>,
        tags: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut result = Self {
            title: title.into(),
            source: source.into(),
            content_type,
            locator: locator.into(),
            tags: BTreeSet::new(),
        };
        result.add_tags(tags);
        result
    }

    /// The dedup identity of this result.
    pub fn identity(&self) -> (&str, &str) {
        (&self.title, &self.locator)
    }

    /// Union the given keywords into the tag set. Empty tags are ignored.
    pub fn add_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            let tag = tag.as_ref().trim().to_lowercase();
            if !tag.is_empty() {
                self.tags.insert(tag);
            }
        }
    }

    /// Returns `true` when the locator is a URL rather than literal text.
    pub fn is_media(&self) -> bool {
        self.content_type != ContentType::Text
    }
}

/// Content providers the searcher knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Locally curated override database.
    Curated,
    /// Reddit subreddit search (primary source).
    Reddit,
    /// Tenor GIF search.
    Tenor,
    /// Imgflip meme template catalogue.
    Imgflip,
}

impl ProviderKind {
    /// Returns the human-readable name of this provider.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Curated => "Curated",
            Self::Reddit => "Reddit",
            Self::Tenor => "Tenor",
            Self::Imgflip => "Imgflip",
        }
    }

    /// Returns all provider variants in default priority order.
    pub fn all() -> &'static [ProviderKind] {
        &[Self::Curated, Self::Reddit, Self::Tenor, Self::Imgflip]
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_result_lowercases_tags() {
        let result = MediaResult::new(
            "Confused Tanjiro",
            "Demon Slayer anime",
            ContentType::Image,
            "https://i.imgur.com/8jcAyUd.jpg",
            ["Tanjiro", " Reaction ", ""],
        );
        assert_eq!(result.tags.len(), 2);
        assert!(result.tags.contains("tanjiro"));
        assert!(result.tags.contains("reaction"));
    }

    #[test]
    fn add_tags_is_idempotent() {
        let mut result = MediaResult::new("t", "s", ContentType::Text, "x", ["a"]);
        result.add_tags(["meme", "a"]);
        result.add_tags(["meme"]);
        assert_eq!(result.tags.len(), 2);
    }

    #[test]
    fn identity_is_title_and_locator() {
        let a = MediaResult::new("Same", "Reddit", ContentType::Image, "https://x/1.jpg", ["a"]);
        let b = MediaResult::new("Same", "Tenor", ContentType::Gif, "https://x/1.jpg", ["b"]);
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn serde_uses_url_field_and_accepts_content_alias() {
        let result = MediaResult::new("t", "s", ContentType::Gif, "https://x/a.gif", ["z"]);
        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json["url"], "https://x/a.gif");
        assert_eq!(json["content_type"], "gif");

        let legacy = r#"{"title":"t","source":"s","content_type":"text","content":"hello","tags":["a"]}"#;
        let decoded: MediaResult = serde_json::from_str(legacy).expect("deserialize");
        assert_eq!(decoded.locator, "hello");
        assert_eq!(decoded.content_type, ContentType::Text);
    }

    #[test]
    fn missing_tags_default_to_empty() {
        let json = r#"{"title":"t","source":"s","content_type":"image","url":"https://x/a.png"}"#;
        let decoded: MediaResult = serde_json::from_str(json).expect("deserialize");
        assert!(decoded.tags.is_empty());
    }

    #[test]
    fn content_type_parse() {
        assert_eq!(ContentType::parse("GIF"), Some(ContentType::Gif));
        assert_eq!(ContentType::parse(" image "), Some(ContentType::Image));
        assert_eq!(ContentType::parse("text"), Some(ContentType::Text));
        assert_eq!(ContentType::parse("video"), None);
    }

    #[test]
    fn content_type_from_url() {
        assert_eq!(ContentType::from_url("https://i.redd.it/a.GIF"), ContentType::Gif);
        assert_eq!(ContentType::from_url("https://x/a.gif?width=3"), ContentType::Gif);
        assert_eq!(ContentType::from_url("https://x/a.png"), ContentType::Image);
    }

    #[test]
    fn is_media() {
        let text = MediaResult::new("t", "s", ContentType::Text, "words", Vec::<String>::new());
        assert!(!text.is_media());
        let gif = MediaResult::new("t", "s", ContentType::Gif, "https://x/a.gif", Vec::<String>::new());
        assert!(gif.is_media());
    }

    #[test]
    fn provider_kind_display_and_all() {
        assert_eq!(ProviderKind::Reddit.to_string(), "Reddit");
        assert_eq!(ProviderKind::all().len(), 4);
        assert_eq!(ProviderKind::all()[0], ProviderKind::Curated);
    }

    #[test]
    fn provider_kind_serde_lowercase() {
        let json = serde_json::to_string(&ProviderKind::Imgflip).expect("serialize");
        assert_eq!(json, "\"imgflip\"");
        let decoded: ProviderKind = serde_json::from_str("\"tenor\"").expect("deserialize");
        assert_eq!(decoded, ProviderKind::Tenor);
    }
}
