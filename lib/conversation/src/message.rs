//! Message types for conversations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use travel_assistant_ai::ChatMessage;
use travel_assistant_core::{MessageId, UserId};

/// The role of a persisted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User/human message.
    User,
    /// Assistant reply.
    Assistant,
}

impl MessageRole {
    /// Returns the role as stored.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(format!("unknown message role: {other}")),
        }
    }
}

/// A persisted message. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,
    /// Message role.
    pub role: MessageRole,
    /// Message content.
    pub content: String,
    /// The user whose conversation this message belongs to.
    pub user_id: UserId,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a new message.
    #[must_use]
    pub fn new(role: MessageRole, user_id: UserId, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: content.into(),
            user_id,
            timestamp: Utc::now(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(user_id: UserId, content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, user_id, content)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(user_id: UserId, content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, user_id, content)
    }

    /// Converts the message into the form sent to the model.
    #[must_use]
    pub fn to_chat_message(&self) -> ChatMessage {
        match self.role {
            MessageRole::User => ChatMessage::user(self.content.clone()),
            MessageRole::Assistant => ChatMessage::assistant(self.content.clone()),
        }
    }
}
