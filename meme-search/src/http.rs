//! Shared blocking HTTP client with User-Agent rotation for provider requests.
//!
//! Provides a configured [`ureq::Agent`] with a bounded timeout and a
//! browser-like User-Agent (some providers reject unknown clients), plus a
//! JSON GET helper that turns every non-200 answer into
//! [`MemeError::ProviderUnavailable`].

use std::time::Duration;

use rand::seq::SliceRandom;
use serde::de::DeserializeOwned;

use crate::config::SearchConfig;
use crate::error::MemeError;

/// Realistic browser User-Agent strings, rotated per agent.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Build a [`ureq::Agent`] configured for provider requests.
///
/// The agent has:
/// - An overall per-request timeout from config
/// - Random User-Agent from the built-in rotation list (or custom if configured)
/// - At most 5 redirects
pub fn build_agent(config: &SearchConfig) -> ureq::Agent {
    build_agent_with_timeout(config.user_agent.as_deref(), config.timeout_seconds)
}

/// Build an agent from an explicit User-Agent override and timeout.
pub fn build_agent_with_timeout(user_agent: Option<&str>, timeout_seconds: u64) -> ureq::Agent {
    let ua = match user_agent {
        Some(ua) => ua,
        None => random_user_agent(),
    };
    ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(ua)
        .redirects(5)
        .build()
}

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        // SAFETY: USER_AGENTS is a non-empty const array, choose only returns None on empty slices
        .unwrap_or(USER_AGENTS[0])
}

/// Send a prepared GET request and decode its JSON body.
///
/// `label` names the provider (and sub-source) in error messages.
///
/// # Errors
///
/// Returns [`MemeError::ProviderUnavailable`] on transport errors, any
/// status other than 200, unreadable bodies, and malformed JSON.
pub fn get_json<T: DeserializeOwned>(request: ureq::Request, label: &str) -> Result<T, MemeError> {
    let response = request.call().map_err(|e| match e {
        ureq::Error::Status(code, _) => {
            MemeError::ProviderUnavailable(format!("{label}: HTTP {code}"))
        }
        ureq::Error::Transport(t) => {
            MemeError::ProviderUnavailable(format!("{label}: request failed: {t}"))
        }
    })?;

    if response.status() != 200 {
        return Err(MemeError::ProviderUnavailable(format!(
            "{label}: HTTP {}",
            response.status()
        )));
    }

    let body = response
        .into_string()
        .map_err(|e| MemeError::ProviderUnavailable(format!("{label}: response read failed: {e}")))?;

    tracing::trace!(bytes = body.len(), label, "provider response received");

    serde_json::from_str(&body)
        .map_err(|e| MemeError::ProviderUnavailable(format!("{label}: malformed payload: {e}")))
}
