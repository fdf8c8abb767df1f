//! Result accumulation with `(title, locator)` deduplication.
//!
//! Results arriving from different strategies and providers are merged into
//! one running set. The first occurrence of an identity wins; later copies
//! are dropped regardless of provenance.

use std::collections::HashSet;

use crate::types::MediaResult;

/// Running, duplicate-free result set.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<(String, String)>,
    results: Vec<MediaResult>,
}

impl Deduplicator {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a result unless its identity was already seen. Returns `true` if added.
    pub fn push(&mut self, result: MediaResult) -> bool {
        let key = (result.title.clone(), result.locator.clone());
        if self.seen.insert(key) {
            self.results.push(result);
            true
        } else {
            false
        }
    }

    /// Add every result, returning how many were new.
    pub fn extend(&mut self, results: impl IntoIterator<Item = MediaResult>) -> usize {
        results
            .into_iter()
            .map(|r| self.push(r))
            .filter(|added| *added)
            .count()
    }

    /// Add results in order until `cap` unique results are held, returning how
    /// many were new. Duplicates never count toward `cap`.
    pub fn extend_up_to(&mut self, results: impl IntoIterator<Item = MediaResult>, cap: usize) -> usize {
        let mut added = 0;
        for result in results {
            if self.results.len() >= cap {
                break;
            }
            if self.push(result) {
                added += 1;
            }
        }
        added
    }

    /// Number of unique results collected.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` if nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Consume the set, returning results in arrival order.
    pub fn into_results(self) -> Vec<MediaResult> {
        self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentType;

    fn make(title: &str, url: &str, source: &str) -> MediaResult {
        MediaResult::new(title, source, ContentType::Image, url, [source])
    }

    #[test]
    fn unique_results_pass_through() {
        let mut dedup = Deduplicator::new();
        assert!(dedup.push(make("A", "https://a/1.jpg", "Reddit")));
        assert!(dedup.push(make("B", "https://a/2.jpg", "Reddit")));
        assert_eq!(dedup.len(), 2);
    }

    #[test]
    fn same_identity_from_other_source_dropped() {
        let mut dedup = Deduplicator::new();
        assert!(dedup.push(make("A", "https://a/1.jpg", "Reddit")));
        assert!(!dedup.push(make("A", "https://a/1.jpg", "Tenor")));
        let results = dedup.into_results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "Reddit");
    }

    #[test]
    fn same_url_different_title_kept() {
        let mut dedup = Deduplicator::new();
        dedup.push(make("A", "https://a/1.jpg", "Reddit"));
        dedup.push(make("B", "https://a/1.jpg", "Reddit"));
        assert_eq!(dedup.len(), 2);
    }

    #[test]
    fn extend_counts_new_entries() {
        let mut dedup = Deduplicator::new();
        dedup.push(make("A", "https://a/1.jpg", "Reddit"));
        let added = dedup.extend(vec![
            make("A", "https://a/1.jpg", "Imgflip"),
            make("C", "https://a/3.jpg", "Imgflip"),
            make("C", "https://a/3.jpg", "Imgflip"),
        ]);
        assert_eq!(added, 1);
        assert_eq!(dedup.len(), 2);
    }

    #[test]
    fn extend_up_to_skips_duplicates_before_capping() {
        let mut dedup = Deduplicator::new();
        dedup.push(make("A", "https://a/1.jpg", "Reddit"));
        dedup.push(make("B", "https://a/2.jpg", "Reddit"));
        let added = dedup.extend_up_to(
            vec![
                make("A", "https://a/1.jpg", "Reddit"),
                make("B", "https://a/2.jpg", "Reddit"),
                make("C", "https://a/3.jpg", "Reddit"),
                make("D", "https://a/4.jpg", "Reddit"),
                make("E", "https://a/5.jpg", "Reddit"),
            ],
            4,
        );
        assert_eq!(added, 2);
        let titles: Vec<_> = dedup.into_results().into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn empty_by_default() {
        let dedup = Deduplicator::new();
        assert!(dedup.is_empty());
        assert!(dedup.into_results().is_empty());
    }
}
