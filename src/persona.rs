//! Tanjiro's voice: system prompt, message assembly and reply generation.

use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::BotError;
use crate::llm::{ChatBackend, ChatMessage, CompletionOptions, OpenAiChat};

/// Character instructions sent as the system message.
pub const SYSTEM_PROMPT: &str = "You are Kamado Tanjiro from Demon Slayer. You are kind, determined, and always willing to help others. \
You speak with respect and use honorifics. You often talk about your family, especially your sister Nezuko, \
and your mission to turn her back into a human. You believe in the power of kindness and never give up, \
even in the face of overwhelming odds. You use phrases like \"I'll do my best!\" and \"I won't give up!\"\n\n\
Respond as Tanjiro would, maintaining his personality and speech patterns.";

/// Reply shown when the backend rejects or lacks credentials.
pub const API_KEY_ERROR: &str =
    "Error: Invalid or missing API key. Please check your API key and try again.";

/// Farewell printed on `exit`/`quit`.
pub const FAREWELL: &str = "Thank you for chatting with me! Take care!";

/// Build the request: system prompt (plus context), prior turns, then `input`.
#[must_use]
pub fn build_messages(input: &str, history: &[(String, String)], context: &str) -> Vec<ChatMessage> {
    let mut system = SYSTEM_PROMPT.to_owned();
    if !context.trim().is_empty() {
        system.push_str("\n\n");
        system.push_str(context);
    }

    let mut messages = Vec::with_capacity(history.len() * 2 + 2);
    messages.push(ChatMessage::system(system));
    for (user, assistant) in history {
        messages.push(ChatMessage::user(user.as_str()));
        messages.push(ChatMessage::assistant(assistant.as_str()));
    }
    messages.push(ChatMessage::user(input));
    messages
}

/// In-character text for a failed reply.
#[must_use]
pub fn error_reply(error: &BotError) -> String {
    let text = error.to_string().to_lowercase();
    if matches!(error, BotError::Auth(_)) || text.contains("auth") || text.contains("api key") {
        API_KEY_ERROR.to_owned()
    } else {
        format!("I apologize, but I encountered an error: {error}")
    }
}

/// The chat persona and the backend it speaks through.
pub struct Persona {
    backend: Option<Box<dyn ChatBackend>>,
    reply_options: CompletionOptions,
    analysis_options: CompletionOptions,
    model_analysis: bool,
}

impl Persona {
    /// Persona using `backend` with the sampling settings from `config`.
    pub fn new(backend: Option<Box<dyn ChatBackend>>, config: &LlmConfig) -> Self {
        Self {
            backend,
            reply_options: CompletionOptions {
                model: Some(config.model.clone()),
                temperature: config.temperature,
                max_tokens: Some(config.max_tokens),
                json_object: false,
            },
            analysis_options: CompletionOptions {
                model: Some(config.analysis_model.clone()),
                temperature: config.analysis_temperature,
                max_tokens: None,
                json_object: true,
            },
            model_analysis: config.llm_interest_analysis,
        }
    }

    /// Persona backed by [`OpenAiChat`] when an API key is available.
    pub fn from_config(config: &LlmConfig) -> Self {
        let backend = config.api_key().map(|key| {
            Box::new(OpenAiChat::new(config, Some(key))) as Box<dyn ChatBackend>
        });
        if backend.is_none() {
            warn!(var = %config.api_key_env, "no API key set, replies are disabled");
        }
        Self::new(backend, config)
    }

    /// The backend, if one is configured.
    pub fn backend(&self) -> Option<&dyn ChatBackend> {
        self.backend.as_deref()
    }

    /// The backend to use for interest analysis, unless disabled in config.
    pub fn analysis_backend(&self) -> Option<&dyn ChatBackend> {
        self.backend().filter(|_| self.model_analysis)
    }

    /// Options used for interest analysis requests.
    pub fn analysis_options(&self) -> &CompletionOptions {
        &self.analysis_options
    }

    /// Generate Tanjiro's reply. Never fails: errors become apology text.
    pub fn respond(&self, input: &str, history: &[(String, String)], context: &str) -> String {
        let Some(backend) = &self.backend else {
            return API_KEY_ERROR.to_owned();
        };
        let messages = build_messages(input, history, context);
        debug!(messages = messages.len(), "generating reply");
        match backend.complete(&messages, &self.reply_options) {
            Ok(reply) => reply.trim().to_owned(),
            Err(e) => {
                warn!(error = %e, "reply generation failed");
                error_reply(&e)
            }
        }
    }
}
