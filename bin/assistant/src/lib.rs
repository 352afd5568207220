//! Command-line travel assistant.
//!
//! Wires the conversation engine to its collaborators: an OpenAI-compatible
//! model, travel data, and either PostgreSQL or in-memory conversation storage.

pub mod config;
pub mod db;
pub mod error;
pub mod repl;

pub use config::AssistantConfig;
pub use db::PgConversationStore;
pub use error::StartupError;
pub use repl::{Command, Repl};
