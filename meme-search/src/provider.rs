//! Trait definition for pluggable meme content providers.
//!
//! Each provider (curated database, Reddit, Tenor, Imgflip) implements
//! [`MemeProvider`] to translate a query string into its native request and
//! map its response schema into [`MediaResult`]s.

use crate::error::MemeError;
use crate::types::{MediaResult, ProviderKind};

/// A pluggable meme content source.
///
/// Implementors only write [`fetch`](MemeProvider::fetch), which reports
/// failures explicitly. The orchestrator calls
/// [`search`](MemeProvider::search), which collapses a failure into an empty
/// list after logging the reason, so one broken provider never aborts a
/// search.
///
/// All implementations must be `Send + Sync`.
pub trait MemeProvider: Send + Sync {
    /// Query the provider and return mapped results.
    ///
    /// Entries that cannot be mapped to a displayable result are skipped,
    /// not reported as errors.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::ProviderUnavailable`] on transport errors,
    /// non-200 responses and malformed payloads.
    fn fetch(&self, query: &str, limit: usize) -> Result<Vec<MediaResult>, MemeError>;

    /// Returns which [`ProviderKind`] this implementation represents.
    fn kind(&self) -> ProviderKind;

    /// Best-effort search: never fails.
    ///
    /// The answer may hold more than `limit` results. Callers cap it after
    /// deduplication.
    fn search(&self, query: &str, limit: usize) -> Vec<MediaResult> {
        tracing::trace!(provider = %self.kind(), query, limit, "provider search");
        match self.fetch(query, limit) {
            Ok(results) => {
                tracing::debug!(provider = %self.kind(), count = results.len(), "provider returned results");
                results
            }
            Err(err) => {
                tracing::warn!(provider = %self.kind(), error = %err, "provider query failed");
                Vec::new()
            }
        }
    }
}
