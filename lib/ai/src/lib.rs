//! Language model gateway for the travel assistant.
//!
//! The model is consumed through one operation: given an ordered message
//! sequence and, optionally, a manifest of capabilities, it either answers
//! directly or names a capability to invoke.
//!
//! - [`LlmGateway`]: the abstract oracle the conversation engine talks to
//! - [`OpenAiGateway`]: an adapter for OpenAI-compatible chat completion APIs

pub mod error;
pub mod gateway;
pub mod openai;

pub use error::LlmError;
pub use gateway::{CapabilityManifestEntry, ChatMessage, ChatRole, Completion, LlmGateway};
pub use openai::{OpenAiConfig, OpenAiGateway};
