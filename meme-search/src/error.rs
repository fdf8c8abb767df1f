//! Error types for the meme-search crate.
//!
//! Only [`MemeError::Config`] is meant to reach callers of the public search
//! API. Provider and cache failures are recovered where they happen, but the
//! explicit variants are kept so the reason stays visible in logs and tests.

/// Errors that can occur while searching for or caching memes.
#[derive(Debug, thiserror::Error)]
pub enum MemeError {
    /// The query had no searchable text at all.
    #[error("empty query")]
    EmptyQuery,

    /// A provider could not be reached, answered with a non-200 status,
    /// or returned a payload that could not be parsed.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Every strategy and fallback was exhausted without a result.
    #[error("no results found: {0}")]
    NoResultsFound(String),

    /// Downloading or writing a media file into the cache failed.
    #[error("cache write failure: {0}")]
    CacheWriteFailure(String),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The override database could not be read or written.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for meme-search results.
pub type Result<T> = std::result::Result<T, MemeError>;
