//! Centralized application directory paths for the Tanjiro bot.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//!
//! # Directory Layout
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | App data | `~/Library/Application Support/tanjiro/` | `~/.local/share/tanjiro/` |
//! | Config | `~/Library/Application Support/tanjiro/` | `~/.config/tanjiro/` |
//! | Cache | `~/Library/Caches/tanjiro/` | `~/.cache/tanjiro/` |
//!
//! # Environment Overrides
//!
//! - `TANJIRO_DATA_DIR` overrides [`data_dir`]
//! - `TANJIRO_CONFIG_DIR` overrides [`config_dir`]
//! - `TANJIRO_CACHE_DIR` overrides [`cache_dir`]

use std::ffi::OsString;
use std::path::PathBuf;

const APP_NAME: &str = "tanjiro";

fn resolve(override_dir: Option<OsString>, platform_dir: Option<PathBuf>, fallback: &str) -> PathBuf {
    if let Some(dir) = override_dir {
        return PathBuf::from(dir);
    }
    platform_dir
        .map(|d| d.join(APP_NAME))
        .unwrap_or_else(|| PathBuf::from(fallback))
}

/// Application data root: conversation memory, override database, logs.
#[must_use]
pub fn data_dir() -> PathBuf {
    resolve(
        std::env::var_os("TANJIRO_DATA_DIR"),
        dirs::data_dir(),
        "/tmp/tanjiro-data",
    )
}

/// Application config directory, home of `config.toml`.
#[must_use]
pub fn config_dir() -> PathBuf {
    resolve(
        std::env::var_os("TANJIRO_CONFIG_DIR"),
        dirs::config_dir(),
        "/tmp/tanjiro-config",
    )
}

/// Application cache directory. Expendable data only.
#[must_use]
pub fn cache_dir() -> PathBuf {
    resolve(
        std::env::var_os("TANJIRO_CACHE_DIR"),
        dirs::cache_dir(),
        "/tmp/tanjiro-cache",
    )
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Log file directory (`data_dir()/logs/`).
#[must_use]
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Conversation memory file (`data_dir()/conversation_cache.json`).
#[must_use]
pub fn conversation_file() -> PathBuf {
    data_dir().join("conversation_cache.json")
}

/// Curated meme override database (`data_dir()/meme_database.json`).
#[must_use]
pub fn meme_database_file() -> PathBuf {
    data_dir().join("meme_database.json")
}

/// Downloaded meme media (`cache_dir()/image_cache/`).
#[must_use]
pub fn media_cache_dir() -> PathBuf {
    cache_dir().join("image_cache")
}
