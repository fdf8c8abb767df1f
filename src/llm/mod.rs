//! Chat-completion backends.
//!
//! The bot talks to any server implementing the OpenAI chat completions
//! API through [`OpenAiChat`]. Everything above this module only sees the
//! [`ChatBackend`] trait, so tests can substitute a scripted backend.

pub mod api;

pub use api::OpenAiChat;

use serde::Serialize;

use crate::error::Result;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model.
    System,
    /// The human side of the conversation.
    User,
    /// A previous model reply.
    Assistant,
}

/// One message in a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// Who wrote the message.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// A system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Per-request sampling options.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    /// Model override; the backend's default model when `None`.
    pub model: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Reply length cap.
    pub max_tokens: Option<u32>,
    /// Ask for a JSON object (`response_format: json_object`).
    pub json_object: bool,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.7,
            max_tokens: None,
            json_object: false,
        }
    }
}

/// A blocking chat-completion backend.
pub trait ChatBackend: Send + Sync {
    /// Send `messages` and return the assistant's reply text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::BotError::Auth`] when credentials are
    /// rejected and [`crate::error::BotError::Llm`] for anything else.
    fn complete(&self, messages: &[ChatMessage], options: &CompletionOptions) -> Result<String>;
}

/// Remove `<think>...</think>` reasoning blocks some models emit.
///
/// An unterminated block hides everything after its opening tag.
pub fn strip_think_blocks(text: &str) -> String {
    const OPEN: &str = "<think>";
    const CLOSE: &str = "</think>";

    let mut visible = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(OPEN) {
        visible.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];
        match after_open.find(CLOSE) {
            Some(end) => rest = &after_open[end + CLOSE.len()..],
            None => return visible.trim().to_owned(),
        }
    }
    visible.push_str(rest);
    visible.trim().to_owned()
}
