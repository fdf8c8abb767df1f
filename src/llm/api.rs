//! OpenAI-compatible API backend.
//!
//! Works with any server implementing the OpenAI chat completions API
//! (OpenAI itself, Ollama, vLLM, llama.cpp server, ...). Requests are
//! blocking and non-streaming: the CLI prints whole replies.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use super::{ChatBackend, ChatMessage, CompletionOptions, strip_think_blocks};
use crate::config::LlmConfig;
use crate::error::{BotError, Result};

/// Chat backend speaking the OpenAI chat completions protocol.
pub struct OpenAiChat {
    agent: ureq::Agent,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiChat {
    /// Create a backend for `config`, authenticating with `api_key` when given.
    pub fn new(config: &LlmConfig, api_key: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build();

        let base = config.base_url.trim_end_matches('/');
        let base = base.strip_suffix("/v1").unwrap_or(base);
        let url = format!("{base}/v1/chat/completions");

        info!(%url, model = %config.model, "chat backend configured");

        Self {
            agent,
            url,
            model: config.model.clone(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    /// Create a backend reading the key from the environment variable
    /// named by `config.api_key_env`.
    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(config, config.api_key())
    }

    /// Whether an API key will be sent.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl ChatBackend for OpenAiChat {
    fn complete(&self, messages: &[ChatMessage], options: &CompletionOptions) -> Result<String> {
        let mut body = serde_json::json!({
            "model": options.model.as_deref().unwrap_or(&self.model),
            "messages": messages,
            "temperature": options.temperature,
        });
        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        if options.json_object {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }

        let body_str = serde_json::to_string(&body)
            .map_err(|e| BotError::Llm(format!("JSON serialization failed: {e}")))?;

        let mut req = self
            .agent
            .post(&self.url)
            .set("Content-Type", "application/json");
        if let Some(ref key) = self.api_key {
            let auth = format!("Bearer {key}");
            req = req.set("Authorization", &auth);
        }

        debug!(messages = messages.len(), json = options.json_object, "sending chat completion");

        let response = req.send_string(&body_str).map_err(|e| match e {
            ureq::Error::Status(code @ (401 | 403), _) => {
                BotError::Auth(format!("API rejected credentials (HTTP {code})"))
            }
            ureq::Error::Status(code, resp) => {
                let detail = resp.into_string().unwrap_or_default();
                BotError::Llm(format!("HTTP {code}: {}", truncate(&detail, 200)))
            }
            ureq::Error::Transport(t) => BotError::Llm(format!("API request failed: {t}")),
        })?;

        let text = response
            .into_string()
            .map_err(|e| BotError::Llm(format!("response read failed: {e}")))?;
        let parsed: CompletionResponse = serde_json::from_str(&text)
            .map_err(|e| BotError::Llm(format!("malformed completion: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| strip_think_blocks(&c))
            .unwrap_or_default();
        if content.is_empty() {
            return Err(BotError::Llm("empty completion".into()));
        }
        Ok(content)
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
