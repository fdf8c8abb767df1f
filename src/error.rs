//! Error types for the Tanjiro bot.

use meme_search::MemeError;

/// Top-level error type for the chat application.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// Chat-completion backend error (transport, status, payload).
    #[error("LLM error: {0}")]
    Llm(String),

    /// The backend rejected the credentials, or none were configured.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Conversation memory storage error.
    #[error("memory error: {0}")]
    Memory(String),

    /// Meme search or media cache error.
    #[error(transparent)]
    Meme(#[from] MemeError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, BotError>;
