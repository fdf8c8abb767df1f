//! Configuration types for the Tanjiro bot.
//!
//! Every section is `#[serde(default)]`, so a config file only needs the
//! keys it changes. Paths left unset resolve through [`crate::app_dirs`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use meme_search::SearchConfig;

use crate::app_dirs;
use crate::error::{BotError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Meme search providers, limits and endpoints.
    pub search: SearchConfig,
    /// Downloaded media cache.
    pub cache: MediaCacheConfig,
    /// Curated meme override database.
    pub overrides: OverridesConfig,
    /// Conversation memory.
    pub memory: MemoryConfig,
    /// Chat-completion backend.
    pub llm: LlmConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

/// Media cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaCacheConfig {
    /// Download memes for local display. When off, remote URLs are shown.
    pub enabled: bool,
    /// Cache directory (None = `cache_dir()/image_cache`).
    pub dir: Option<PathBuf>,
    /// Download timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for MediaCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            timeout_seconds: 10,
        }
    }
}

/// Override database configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverridesConfig {
    /// Database file (None = `data_dir()/meme_database.json`).
    pub path: Option<PathBuf>,
    /// Seed a missing database with the built-in starter memes.
    pub seed_defaults: bool,
}

/// Conversation memory configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Cache file (None = `data_dir()/conversation_cache.json`).
    pub path: Option<PathBuf>,
    /// Number of interactions kept.
    pub max_entries: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_entries: 10,
        }
    }
}

/// OpenAI-compatible chat backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API root; `/v1/chat/completions` is appended.
    pub base_url: String,
    /// Model used for in-character replies.
    pub model: String,
    /// Model used for interest analysis.
    pub analysis_model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Sampling temperature for replies.
    pub temperature: f32,
    /// Sampling temperature for interest analysis.
    pub analysis_temperature: f32,
    /// Reply length cap.
    pub max_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Ask the model for interest analysis before falling back to keywords.
    pub llm_interest_analysis: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_owned(),
            model: "gpt-3.5-turbo".to_owned(),
            analysis_model: "gpt-3.5-turbo".to_owned(),
            api_key_env: "OPENAI_API_KEY".to_owned(),
            temperature: 0.7,
            analysis_temperature: 0.2,
            max_tokens: 500,
            timeout_seconds: 60,
            llm_interest_analysis: true,
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable.
    ///
    /// Empty values count as missing.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|k| k.trim().to_owned())
            .filter(|k| !k.is_empty())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Also write a daily-rolling log file.
    pub file: bool,
    /// Log directory (None = `data_dir()/logs`).
    pub dir: Option<PathBuf>,
    /// Filter directive used when `RUST_LOG` is unset.
    pub filter: Option<String>,
}

impl BotConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| BotError::Config(e.to_string()))
    }

    /// Load `path` if given, else the default config file if it exists,
    /// else defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        let default_path = Self::default_config_path();
        if default_path.exists() {
            Self::from_file(&default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| BotError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> PathBuf {
        app_dirs::config_file()
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.search
            .validate()
            .map_err(|e| BotError::Config(format!("search: {e}")))?;
        if self.memory.max_entries == 0 {
            return Err(BotError::Config(
                "memory.max_entries must be greater than 0".into(),
            ));
        }
        if self.cache.timeout_seconds == 0 {
            return Err(BotError::Config(
                "cache.timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.llm.timeout_seconds == 0 {
            return Err(BotError::Config(
                "llm.timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.llm.base_url.trim().is_empty() || self.llm.model.trim().is_empty() {
            return Err(BotError::Config(
                "llm.base_url and llm.model must be set".into(),
            ));
        }
        Ok(())
    }

    /// Resolved conversation memory file.
    pub fn memory_file(&self) -> PathBuf {
        self.memory
            .path
            .clone()
            .unwrap_or_else(app_dirs::conversation_file)
    }

    /// Resolved override database file.
    pub fn overrides_file(&self) -> PathBuf {
        self.overrides
            .path
            .clone()
            .unwrap_or_else(app_dirs::meme_database_file)
    }

    /// Resolved media cache directory.
    pub fn media_cache_dir(&self) -> PathBuf {
        self.cache.dir.clone().unwrap_or_else(app_dirs::media_cache_dir)
    }

    /// Resolved log directory.
    pub fn logs_dir(&self) -> PathBuf {
        self.logging.dir.clone().unwrap_or_else(app_dirs::logs_dir)
    }
}
