//! Language model gateway abstraction.
//!
//! Provides a unified interface over whatever model answers the conversation.
//! The gateway never executes anything itself: when it decides a capability is
//! needed it only names it, and the caller is responsible for validation and
//! execution.

use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// The role of a message sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Policy or instruction message.
    System,
    /// User/human message.
    User,
    /// Assistant/AI message.
    Assistant,
    /// Raw output of a capability, tagged with the capability name.
    Capability,
}

/// A role-tagged message in the sequence sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender.
    pub role: ChatRole,
    /// The content of the message.
    pub content: String,
    /// Name of the capability that produced this message, for capability roles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
        }
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    /// Creates a message carrying the raw result of a capability.
    #[must_use]
    pub fn capability_result(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Capability,
            content: content.into(),
            name: Some(name.into()),
        }
    }
}

/// Description of a capability the model may choose to invoke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityManifestEntry {
    /// Unique capability name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON schema for the capability parameters.
    pub parameter_schema: JsonValue,
}

impl CapabilityManifestEntry {
    /// Creates a manifest entry with an empty parameter schema.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameter_schema: serde_json::json!({ "type": "object", "properties": {} }),
        }
    }

    /// Sets the parameter schema.
    #[must_use]
    pub fn with_parameter_schema(mut self, schema: JsonValue) -> Self {
        self.parameter_schema = schema;
        self
    }
}

/// What the model decided to do with a message sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// A direct natural-language answer.
    TextAnswer(String),
    /// A request to invoke a named capability.
    ///
    /// The arguments are kept as the raw JSON text the model produced; they
    /// are untrusted until the caller validates them.
    CapabilityIntent {
        /// The capability name as chosen by the model.
        name: String,
        /// The arguments as a JSON document.
        arguments_json: String,
    },
}

/// Trait for language model gateways.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Completes the given message sequence.
    ///
    /// When `manifest` is `None` only [`Completion::TextAnswer`] is a valid
    /// outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be reached or its reply cannot be
    /// understood.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        manifest: Option<&[CapabilityManifestEntry]>,
    ) -> Result<Completion, LlmError>;
}

#[async_trait]
impl<T: LlmGateway + ?Sized> LlmGateway for Arc<T> {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        manifest: Option<&[CapabilityManifestEntry]>,
    ) -> Result<Completion, LlmError> {
        (**self).complete(messages, manifest).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_message_creation() {
        assert_eq!(ChatMessage::user("Hi").role, ChatRole::User);
        assert_eq!(ChatMessage::assistant("Hello").role, ChatRole::Assistant);

        let result = ChatMessage::capability_result("get_weather_info", "Sunny");
        assert_eq!(result.role, ChatRole::Capability);
        assert_eq!(result.name.as_deref(), Some("get_weather_info"));
    }

    #[test]
    fn manifest_entry_builder() {
        let entry = CapabilityManifestEntry::new("get_hotels_info", "Search hotels")
            .with_parameter_schema(serde_json::json!({
                "type": "object",
                "properties": { "city": { "type": "string" } },
                "required": ["city"]
            }));

        assert_eq!(entry.name, "get_hotels_info");
        assert_eq!(entry.parameter_schema["required"][0], "city");
    }

    struct Echo;

    #[async_trait]
    impl LlmGateway for Echo {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _manifest: Option<&[CapabilityManifestEntry]>,
        ) -> Result<Completion, LlmError> {
            Ok(Completion::TextAnswer(
                messages.last().map(|m| m.content.clone()).unwrap_or_default(),
            ))
        }
    }

    #[tokio::test]
    async fn arc_gateway_delegates() {
        let gateway = Arc::new(Echo);
        let completion = gateway
            .complete(&[ChatMessage::user("ping")], None)
            .await
            .expect("complete");
        assert_eq!(completion, Completion::TextAnswer("ping".into()));
    }
}
