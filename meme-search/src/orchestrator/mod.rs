//! Search orchestrator: normalisation, strategy planning, sequential
//! provider queries, dedup and fallbacks.
//!
//! A raw query is normalised into a base string plus hashtags, expanded
//! into an ordered list of strategies, and run against the providers one
//! strategy at a time until enough unique results have been collected.

pub mod dedup;
pub mod normalize;
pub mod search;
pub mod strategy;
