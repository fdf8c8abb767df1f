//! Curated provider: answers from the local override database.
//!
//! No network access. Listed first by default so hand-picked entries win
//! over anything fetched remotely.

use crate::error::MemeError;
use crate::overrides::SharedOverrides;
use crate::provider::MemeProvider;
use crate::types::{MediaResult, ProviderKind};

/// Provider backed by a shared [`OverrideDb`](crate::overrides::OverrideDb).
pub struct CuratedProvider {
    db: SharedOverrides,
}

impl CuratedProvider {
    /// Wrap a shared override database.
    pub fn new(db: SharedOverrides) -> Self {
        Self { db }
    }
}

impl MemeProvider for CuratedProvider {
    fn fetch(&self, query: &str, _limit: usize) -> Result<Vec<MediaResult>, MemeError> {
        let db = self
            .db
            .read()
            .map_err(|_| MemeError::Database("override database lock poisoned".into()))?;
        Ok(db.lookup(query))
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Curated
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::overrides::OverrideDb;
    use crate::types::ContentType;

    #[test]
    fn sees_entries_added_after_construction() {
        let shared = OverrideDb::in_memory().into_shared();
        let provider = CuratedProvider::new(shared.clone());
        assert!(provider.fetch("giyu", 5).unwrap().is_empty());

        shared
            .write()
            .unwrap()
            .add(
                "giyu",
                MediaResult::new("Giyu alone", "me", ContentType::Text, "nobody likes me", ["giyu"]),
            )
            .unwrap();

        let results = provider.fetch("giyu", 5).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Giyu alone");
    }

    #[test]
    fn kind_is_curated() {
        let provider = CuratedProvider::new(OverrideDb::in_memory().into_shared());
        assert_eq!(provider.kind(), ProviderKind::Curated);
    }
}
