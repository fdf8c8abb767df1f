//! Tanjiro: a Demon Slayer character chatbot with meme search.
//!
//! # Architecture
//!
//! Each line of user input goes through one [`session::Session`]:
//! - **Commands**: `history`, `interests`, `clear`, `exit`/`quit`
//! - **Memes**: `meme <topic>`, `next meme`, `previous meme` and
//!   `add meme ...`, backed by the [`meme_search`] crate and a local media cache
//! - **Chat**: everything else goes to an OpenAI-compatible backend
//!   ([`llm`]) in character ([`persona`]), with context from the user's
//!   interests ([`interests`]) over recent conversation memory ([`memory`])

pub mod app_dirs;
pub mod config;
pub mod error;
pub mod interests;
pub mod llm;
pub mod memory;
pub mod persona;
pub mod session;

pub use config::BotConfig;
pub use error::{BotError, Result};
pub use session::{Reply, Session};
