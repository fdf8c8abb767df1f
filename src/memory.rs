//! Conversation memory: the most recent interactions, persisted as JSON.
//!
//! The file holds a plain array of [`Interaction`] records, oldest first,
//! so it is easy to inspect or delete by hand. It is rewritten wholesale
//! after every change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{BotError, Result};

/// One user turn and the bot's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    /// When the turn was recorded.
    pub timestamp: DateTime<Utc>,
    /// What the user typed.
    pub user_input: String,
    /// What the bot answered, if anything.
    #[serde(default)]
    pub response: Option<String>,
}

/// Fixed-capacity interaction history.
#[derive(Debug)]
pub struct ConversationMemory {
    path: Option<PathBuf>,
    entries: VecDeque<Interaction>,
    max_entries: usize,
}

impl ConversationMemory {
    /// Memory that is never written to disk.
    #[must_use]
    pub fn in_memory(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            path: None,
            entries: VecDeque::with_capacity(max_entries),
            max_entries,
        }
    }

    /// Load memory from `path`.
    ///
    /// A missing or unreadable file starts an empty history. When the file
    /// holds more than `max_entries` records only the newest are kept.
    pub fn load(path: &Path, max_entries: usize) -> Self {
        let mut memory = Self::in_memory(max_entries);
        memory.path = Some(path.to_path_buf());

        if !path.exists() {
            debug!(path = %path.display(), "no conversation cache yet");
            return memory;
        }

        let loaded = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|body| {
                serde_json::from_str::<Vec<Interaction>>(&body).map_err(|e| e.to_string())
            });
        match loaded {
            Ok(entries) => {
                for entry in entries {
                    memory.push(entry);
                }
                debug!(entries = memory.len(), "conversation cache loaded");
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable conversation cache");
            }
        }
        memory
    }

    /// Backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Capacity of the ring.
    #[must_use]
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    fn push(&mut self, entry: Interaction) {
        if self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Record a turn, evicting the oldest when full, and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache file cannot be written. The turn stays
    /// recorded in memory either way.
    pub fn record(&mut self, user_input: &str, response: Option<&str>) -> Result<()> {
        self.push(Interaction {
            timestamp: Utc::now(),
            user_input: user_input.to_owned(),
            response: response.map(str::to_owned),
        });
        self.save()
    }

    /// Fill in the reply of the newest interaction if it is still pending,
    /// otherwise record a new turn. Saves either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache file cannot be written.
    pub fn complete_last(&mut self, user_input: &str, response: &str) -> Result<()> {
        match self.entries.back_mut() {
            Some(last) if last.response.is_none() && last.user_input == user_input => {
                last.response = Some(response.to_owned());
                self.save()
            }
            _ => self.record(user_input, Some(response)),
        }
    }

    /// The newest `count` interactions, oldest first. `None` returns all.
    #[must_use]
    pub fn recent(&self, count: Option<usize>) -> Vec<Interaction> {
        let skip = count.map_or(0, |c| self.entries.len().saturating_sub(c));
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Every stored interaction, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &Interaction> {
        self.entries.iter()
    }

    /// Forget everything and save the empty history.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache file cannot be written.
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.save()
    }

    /// Number of stored interactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the whole history to the backing file.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Memory`] on serialization failure or an I/O error.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let entries: Vec<&Interaction> = self.entries.iter().collect();
        let body = serde_json::to_string_pretty(&entries)
            .map_err(|e| BotError::Memory(format!("failed to serialize history: {e}")))?;
        std::fs::write(path, body)?;
        Ok(())
    }
}

/// Render history the way the `history` command shows it.
#[must_use]
pub fn format_history(entries: &[Interaction]) -> String {
    if entries.is_empty() {
        return "No conversation history available.".to_owned();
    }
    let rule = "=".repeat(50);
    let mut out = format!("{rule}\nRecent Conversation History:\n{rule}\n");
    for (i, entry) in entries.iter().enumerate() {
        let when = entry.timestamp.format("%Y-%m-%d %H:%M:%S");
        out.push_str(&format!("\n[{}] {when}\n", i + 1));
        out.push_str(&format!("You: {}\n", entry.user_input));
        out.push_str(&format!(
            "Tanjiro: {}\n",
            entry.response.as_deref().unwrap_or("")
        ));
        out.push_str(&"-".repeat(30));
        out.push('\n');
    }
    out
}
