//! Core search pipeline: strategies × providers, fallbacks, tag union, shuffle.
//!
//! Everything runs sequentially on the calling thread. A provider that
//! fails or times out contributes nothing and the pipeline moves on.

use rand::seq::SliceRandom;

use crate::config::SearchConfig;
use crate::error::MemeError;
use crate::provider::MemeProvider;
use crate::types::MediaResult;

use super::dedup::Deduplicator;
use super::normalize::{NormalizedQuery, normalize};
use super::strategy::plan;

/// Subjects that earn the franchise fallback query when nothing was found.
const FRANCHISE_CORE: &[&str] = &[
    "tanjiro",
    "nezuko",
    "zenitsu",
    "inosuke",
    "demon slayer",
    "demonslayer",
    "kimetsu no yaiba",
    "muzan",
    "hashira",
];

/// Run a full meme search against `providers`.
///
/// # Pipeline
///
/// 1. Normalise the query and plan strategies
/// 2. For each strategy, [`online_search`] until `limit` unique results
/// 3. If nothing was found, retry with `base + " meme"`, then the franchise
///    fallback query for franchise subjects
/// 4. Union every hashtag into every result's tags
/// 5. Shuffle, truncate to `limit`
///
/// # Errors
///
/// Returns [`MemeError::EmptyQuery`] for blank input and
/// [`MemeError::NoResultsFound`] when every strategy and fallback came back
/// empty. Provider failures are never returned.
pub fn orchestrate_search(
    providers: &[Box<dyn MemeProvider>],
    config: &SearchConfig,
    raw: &str,
    limit: usize,
) -> Result<Vec<MediaResult>, MemeError> {
    let query = normalize(raw)?;
    if limit == 0 {
        return Ok(Vec::new());
    }

    let strategies = plan(&query, raw);
    let mut acc = Deduplicator::new();

    for strategy in &strategies {
        if acc.len() >= limit {
            break;
        }
        tracing::debug!(%strategy, have = acc.len(), limit, "trying strategy");
        online_search(providers, strategy, limit, &mut acc);
    }

    if acc.is_empty() {
        let generic = format!("{} meme", query.base);
        tracing::debug!(query = %generic, "no results, generic retry");
        query_providers(providers, &generic, limit, &mut acc);
    }

    if acc.is_empty() && is_franchise_subject(&query) {
        let fallback = config.franchise_fallback_query.as_str();
        tracing::debug!(query = fallback, "no results, franchise fallback");
        query_providers(providers, fallback, limit, &mut acc);
    }

    if acc.is_empty() {
        return Err(MemeError::NoResultsFound(raw.trim().to_owned()));
    }

    let mut results = acc.into_results();
    for result in &mut results {
        result.add_tags(&query.hashtags);
    }
    results.shuffle(&mut rand::thread_rng());
    results.truncate(limit);

    tracing::info!(query = %query.base, count = results.len(), "meme search complete");
    Ok(results)
}

/// Query providers with `strategy`, then with `strategy + " meme"`, then
/// `"anime " + strategy`, moving to the next rewrite only while short of
/// `limit`.
pub fn online_search(
    providers: &[Box<dyn MemeProvider>],
    strategy: &str,
    limit: usize,
    acc: &mut Deduplicator,
) {
    let rewrites = [
        strategy.to_owned(),
        format!("{strategy} meme"),
        format!("anime {strategy}"),
    ];
    for rewrite in &rewrites {
        if acc.len() >= limit {
            break;
        }
        query_providers(providers, rewrite, limit, acc);
    }
}

/// Ask each provider in priority order for the results still missing.
///
/// A provider's whole answer is merged, so duplicates at the front of an
/// over-fetched page do not crowd out the new results behind them.
fn query_providers(
    providers: &[Box<dyn MemeProvider>],
    query: &str,
    limit: usize,
    acc: &mut Deduplicator,
) {
    for provider in providers {
        if acc.len() >= limit {
            break;
        }
        let need = limit - acc.len();
        let added = acc.extend_up_to(provider.search(query, need), limit);
        tracing::trace!(provider = %provider.kind(), query, added, "merged provider results");
    }
}

fn is_franchise_subject(query: &NormalizedQuery) -> bool {
    let padded = format!(" {} ", query.base);
    FRANCHISE_CORE.iter().any(|subject| {
        padded.contains(&format!(" {subject} "))
            || query.hashtags.iter().any(|tag| tag == subject)
    })
}
