//! Meme provider implementations.
//!
//! Each module provides a struct implementing [`crate::provider::MemeProvider`]
//! that maps one content source's response schema into [`crate::MediaResult`]s.

pub mod curated;
pub mod imgflip;
pub mod reddit;
pub mod tenor;

pub use curated::CuratedProvider;
pub use imgflip::ImgflipProvider;
pub use reddit::RedditProvider;
pub use tenor::TenorProvider;

use crate::config::SearchConfig;
use crate::overrides::SharedOverrides;
use crate::provider::MemeProvider;
use crate::types::ProviderKind;

/// Instantiate the providers listed in `config.providers`, in order.
///
/// Tenor is skipped (with a log line) when no API key is configured.
pub fn build_providers(
    config: &SearchConfig,
    overrides: &SharedOverrides,
) -> Vec<Box<dyn MemeProvider>> {
    let mut providers: Vec<Box<dyn MemeProvider>> = Vec::with_capacity(config.providers.len());
    for kind in &config.providers {
        match kind {
            ProviderKind::Curated => {
                providers.push(Box::new(CuratedProvider::new(overrides.clone())));
            }
            ProviderKind::Reddit => providers.push(Box::new(RedditProvider::new(config))),
            ProviderKind::Tenor => match config.tenor_api_key.as_deref() {
                Some(key) if !key.trim().is_empty() => {
                    providers.push(Box::new(TenorProvider::new(config, key.trim())));
                }
                _ => tracing::info!("tenor api key not configured, skipping Tenor provider"),
            },
            ProviderKind::Imgflip => providers.push(Box::new(ImgflipProvider::new(config))),
        }
    }
    providers
}
