//! User interest analysis over conversation memory.
//!
//! Two layers:
//!
//! 1. **Model analysis**: the chat backend is asked for a JSON object of
//!    weighted topics (1-5) plus a one-line summary.
//! 2. **Keyword fallback**: case-insensitive substring counts against fixed
//!    franchise and general keyword tables. Used when no backend is
//!    configured or the model call fails in any way.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::llm::{ChatBackend, ChatMessage, CompletionOptions};
use crate::memory::Interaction;

/// Summary attached to keyword-only analyses.
pub const KEYWORD_SUMMARY: &str = "Analysis based on keyword matching only.";

const ANALYST_PROMPT: &str =
    "You are an analysis assistant that identifies topics and patterns in conversation data.";

// ── Keyword tables ──────────────────────────────────────────────────────

const FRANCHISE_KEYWORDS: &[&str] = &[
    "nezuko",
    "family",
    "demons",
    "breathing technique",
    "muzan",
    "hashira",
    "sword",
    "water breathing",
    "mission",
    "sister",
    "training",
    "final selection",
    "urokodaki",
    "hinokami",
    "dance",
    "slayer",
    "corps",
    "inosuke",
    "zenitsu",
    "fight",
];

const GENERAL_KEYWORDS: &[&str] = &[
    "help", "friend", "strong", "kind", "power", "protect", "love", "hope", "mission", "goal",
    "dream", "future",
];

/// Weighted topics the user has talked about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InterestAnalysis {
    /// Franchise topics (characters, techniques, plot) and their weights.
    #[serde(rename = "demon_slayer_topics")]
    pub franchise_topics: BTreeMap<String, u32>,
    /// Everything else.
    pub general_topics: BTreeMap<String, u32>,
    /// Free-text summary, when one was produced.
    pub summary: Option<String>,
}

impl InterestAnalysis {
    /// Whether no topics were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.franchise_topics.is_empty() && self.general_topics.is_empty()
    }

    /// Parse a model reply. Weights may arrive as integers, floats or
    /// numeric strings; anything else is dropped.
    pub fn from_model_json(text: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(text.trim()).ok()?;
        let object = value.as_object()?;
        let franchise_topics = weights(object.get("demon_slayer_topics"));
        let general_topics = weights(object.get("general_topics"));
        let summary = object
            .get("summary")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
        Some(Self {
            franchise_topics,
            general_topics,
            summary,
        })
    }

    /// Franchise and general topics merged (general wins on name clashes),
    /// heaviest first, ties by name.
    #[must_use]
    pub fn ranked_topics(&self) -> Vec<(&str, u32)> {
        let mut merged: BTreeMap<&str, u32> = BTreeMap::new();
        for (topic, weight) in self.franchise_topics.iter().chain(&self.general_topics) {
            merged.insert(topic.as_str(), *weight);
        }
        let mut ranked: Vec<_> = merged.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

fn weights(value: Option<&Value>) -> BTreeMap<String, u32> {
    let Some(Value::Object(map)) = value else {
        return BTreeMap::new();
    };
    map.iter()
        .filter_map(|(topic, weight)| {
            let weight = match weight {
                Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.round() as u64)),
                Value::String(s) => s.trim().parse::<u64>().ok(),
                _ => None,
            }?;
            let weight = u32::try_from(weight).ok()?;
            (weight > 0).then(|| (topic.trim().to_owned(), weight))
        })
        .filter(|(topic, _)| !topic.is_empty())
        .collect()
}

/// Count keyword occurrences across the user's inputs.
///
/// Each interaction counts at most once per keyword.
#[must_use]
pub fn keyword_analysis(entries: &[Interaction]) -> InterestAnalysis {
    let count = |table: &[&str]| -> BTreeMap<String, u32> {
        let mut counts = BTreeMap::new();
        for entry in entries {
            let input = entry.user_input.to_lowercase();
            for keyword in table {
                if input.contains(keyword) {
                    *counts.entry((*keyword).to_owned()).or_insert(0) += 1;
                }
            }
        }
        counts
    };

    InterestAnalysis {
        franchise_topics: count(FRANCHISE_KEYWORDS),
        general_topics: count(GENERAL_KEYWORDS),
        summary: Some(KEYWORD_SUMMARY.to_owned()),
    }
}

fn analysis_prompt(entries: &[Interaction]) -> String {
    let mut prompt = String::from(
        "Analyze the following user messages from a conversation with Tanjiro (from Demon Slayer anime).\n\
         Identify key topics of interest, both related to Demon Slayer and general topics.\n\n\
         For Demon Slayer topics, consider: characters (Nezuko, Zenitsu, etc), abilities (breathing techniques, etc),\n\
         plot elements (Muzan, demons, etc), relationships, and other anime-specific content.\n\n\
         For general topics, identify themes, personal interests, and conversation patterns.\n\n\
         User messages:\n",
    );
    for (i, entry) in entries.iter().enumerate() {
        prompt.push_str(&format!("\n{}. {}", i + 1, entry.user_input));
    }
    prompt.push_str(
        "\n\nPlease analyze and return a JSON object with the following structure:\n\
         {\n\
         \x20   \"demon_slayer_topics\": {\"topic1\": weight, \"topic2\": weight, ...},\n\
         \x20   \"general_topics\": {\"topic1\": weight, \"topic2\": weight, ...},\n\
         \x20   \"summary\": \"Brief summary of user's apparent interests\"\n\
         }\n\n\
         Where weights are integers 1-5 indicating the importance/frequency of the topic in the conversation.\n\
         Identify synonyms and related concepts (e.g. \"sister\" and \"Nezuko\" might be related).\n\
         Include only topics that are actually discussed.",
    );
    prompt
}

/// Analyze `entries`, preferring the model when a backend is given.
///
/// Empty history yields an empty analysis without calling anything.
pub fn analyze(
    entries: &[Interaction],
    backend: Option<&dyn ChatBackend>,
    options: &CompletionOptions,
) -> InterestAnalysis {
    if entries.is_empty() {
        return InterestAnalysis::default();
    }

    if let Some(backend) = backend {
        let messages = [
            ChatMessage::system(ANALYST_PROMPT),
            ChatMessage::user(analysis_prompt(entries)),
        ];
        let options = CompletionOptions {
            json_object: true,
            ..options.clone()
        };
        match backend.complete(&messages, &options) {
            Ok(reply) => match InterestAnalysis::from_model_json(&reply) {
                Some(analysis) => {
                    debug!(
                        franchise = analysis.franchise_topics.len(),
                        general = analysis.general_topics.len(),
                        "model interest analysis"
                    );
                    return analysis;
                }
                None => warn!("interest analysis reply was not a JSON object"),
            },
            Err(e) => warn!(error = %e, "interest analysis failed, using keywords"),
        }
    }

    keyword_analysis(entries)
}

/// Context lines appended to the system prompt: top three topics and the
/// summary. Empty when there is nothing to say.
#[must_use]
pub fn context_for_prompt(analysis: &InterestAnalysis) -> String {
    let mut parts = Vec::new();
    let top: Vec<&str> = analysis
        .ranked_topics()
        .into_iter()
        .take(3)
        .map(|(topic, _)| topic)
        .collect();
    if !top.is_empty() {
        parts.push(format!(
            "The user has shown interest in these topics: {}.",
            top.join(", ")
        ));
    }
    if let Some(summary) = &analysis.summary {
        parts.push(format!("User context: {summary}"));
    }
    parts.join("\n")
}

fn push_section(out: &mut String, heading: &str, topics: &BTreeMap<String, u32>) {
    out.push_str(heading);
    let mut sorted: Vec<_> = topics.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(a.1));
    for (topic, weight) in sorted {
        let stars = "★".repeat(*weight as usize);
        out.push_str(&format!("- {topic}: {stars} ({weight})\n"));
    }
}

/// Markdown listing for the `interests` command.
#[must_use]
pub fn format_interests(analysis: &InterestAnalysis) -> String {
    let mut out = String::from("📚 **Tanjiro's Understanding of Your Interests**:\n\n");
    if analysis.is_empty() {
        out.push_str("_I haven't identified any specific topics yet._");
        return out;
    }
    if !analysis.franchise_topics.is_empty() {
        push_section(&mut out, "🔸 **Demon Slayer Topics**:\n", &analysis.franchise_topics);
    }
    if !analysis.general_topics.is_empty() {
        push_section(&mut out, "\n🔹 **General Topics**:\n", &analysis.general_topics);
    }
    if let Some(summary) = &analysis.summary {
        out.push_str(&format!("\n🧠 **Summary**:\n{summary}"));
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::error::{BotError, Result};
    use chrono::Utc;
    use std::sync::Mutex;

    fn turn(text: &str) -> Interaction {
        Interaction {
            timestamp: Utc::now(),
            user_input: text.to_owned(),
            response: None,
        }
    }

    struct Scripted {
        reply: Result<String>,
        seen: Mutex<Vec<CompletionOptions>>,
    }

    impl Scripted {
        fn new(reply: Result<String>) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl ChatBackend for Scripted {
        fn complete(&self, _messages: &[ChatMessage], options: &CompletionOptions) -> Result<String> {
            self.seen.lock().unwrap().push(options.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(BotError::Llm(e.to_string())),
            }
        }
    }

    #[test]
    fn keywords_count_once_per_message() {
        let entries = [
            turn("Tell me about Nezuko, your sister"),
            turn("nezuko nezuko nezuko"),
            turn("I want to be strong and protect my friend"),
        ];
        let analysis = keyword_analysis(&entries);
        assert_eq!(analysis.franchise_topics.get("nezuko"), Some(&2));
        assert_eq!(analysis.franchise_topics.get("sister"), Some(&1));
        assert_eq!(analysis.general_topics.get("strong"), Some(&1));
        assert_eq!(analysis.general_topics.get("friend"), Some(&1));
        assert!(!analysis.franchise_topics.contains_key("muzan"));
        assert_eq!(analysis.summary.as_deref(), Some(KEYWORD_SUMMARY));
    }

    #[test]
    fn empty_history_skips_backend() {
        let backend = Scripted::new(Ok("{}".into()));
        let analysis = analyze(&[], Some(&backend), &CompletionOptions::default());
        assert!(analysis.is_empty());
        assert!(analysis.summary.is_none());
        assert!(backend.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn model_reply_is_used_and_json_requested() {
        let backend = Scripted::new(Ok(r#"{
            "demon_slayer_topics": {"Nezuko": 5, "Hashira": "3"},
            "general_topics": {"family": 2.0, "bogus": "lots"},
            "summary": "Loves the Kamado siblings."
        }"#
        .into()));
        let analysis = analyze(
            &[turn("nezuko!")],
            Some(&backend),
            &CompletionOptions::default(),
        );
        assert_eq!(analysis.franchise_topics.get("Nezuko"), Some(&5));
        assert_eq!(analysis.franchise_topics.get("Hashira"), Some(&3));
        assert_eq!(analysis.general_topics.get("family"), Some(&2));
        assert!(!analysis.general_topics.contains_key("bogus"));
        assert_eq!(analysis.summary.as_deref(), Some("Loves the Kamado siblings."));
        assert!(backend.seen.lock().unwrap()[0].json_object);
    }

    #[test]
    fn failures_fall_back_to_keywords() {
        let entries = [turn("water breathing training")];

        let failing = Scripted::new(Err(BotError::Llm("HTTP 500".into())));
        let analysis = analyze(&entries, Some(&failing), &CompletionOptions::default());
        assert_eq!(analysis.summary.as_deref(), Some(KEYWORD_SUMMARY));
        assert_eq!(analysis.franchise_topics.get("training"), Some(&1));

        let garbled = Scripted::new(Ok("not json at all".into()));
        let analysis = analyze(&entries, Some(&garbled), &CompletionOptions::default());
        assert_eq!(analysis.franchise_topics.get("water breathing"), Some(&1));

        let analysis = analyze(&entries, None, &CompletionOptions::default());
        assert_eq!(analysis.summary.as_deref(), Some(KEYWORD_SUMMARY));
    }

    #[test]
    fn context_lists_top_three() {
        let mut analysis = InterestAnalysis::default();
        analysis.franchise_topics.insert("nezuko".into(), 5);
        analysis.franchise_topics.insert("sword".into(), 1);
        analysis.general_topics.insert("hope".into(), 4);
        analysis.general_topics.insert("kind".into(), 3);
        analysis.summary = Some("A hopeful fan.".into());
        assert_eq!(
            context_for_prompt(&analysis),
            "The user has shown interest in these topics: nezuko, hope, kind.\nUser context: A hopeful fan."
        );
    }

    #[test]
    fn context_empty_without_topics_or_summary() {
        assert_eq!(context_for_prompt(&InterestAnalysis::default()), "");
    }

    #[test]
    fn general_weight_wins_on_clash() {
        let mut analysis = InterestAnalysis::default();
        analysis.franchise_topics.insert("mission".into(), 1);
        analysis.general_topics.insert("mission".into(), 4);
        assert_eq!(analysis.ranked_topics(), vec![("mission", 4)]);
    }

    #[test]
    fn format_lists_stars() {
        let mut analysis = InterestAnalysis::default();
        analysis.franchise_topics.insert("nezuko".into(), 3);
        analysis.general_topics.insert("hope".into(), 1);
        analysis.summary = Some(KEYWORD_SUMMARY.into());
        let text = format_interests(&analysis);
        assert!(text.starts_with("📚 **Tanjiro's Understanding of Your Interests**:\n\n"));
        assert!(text.contains("🔸 **Demon Slayer Topics**:\n- nezuko: ★★★ (3)\n"));
        assert!(text.contains("\n🔹 **General Topics**:\n- hope: ★ (1)\n"));
        assert!(text.ends_with("\n🧠 **Summary**:\nAnalysis based on keyword matching only."));
    }

    #[test]
    fn format_empty() {
        assert!(format_interests(&InterestAnalysis::default())
            .ends_with("_I haven't identified any specific topics yet._"));
    }
}
