//! Context assembly for the model.
//!
//! The context is rebuilt from persisted history on every turn; nothing is
//! cached between turns.

use crate::message::Message;
use travel_assistant_ai::ChatMessage;

/// Instruction placed first in every context.
pub const POLICY_INSTRUCTION: &str = "You are a helpful travel assistant. \
Use one of the available tools whenever the request needs flight, hotel, \
restaurant or weather information. Never invent results: only report what a \
tool returned. If a request has nothing to do with travel, answer briefly and \
politely.";

/// Builds the ordered message sequence sent to the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextAssembler {
    window: Option<usize>,
}

impl ContextAssembler {
    /// Creates an assembler that includes the whole history.
    #[must_use]
    pub const fn new() -> Self {
        Self { window: None }
    }

    /// Limits the context to the last `messages` persisted messages.
    #[must_use]
    pub const fn with_window(mut self, messages: usize) -> Self {
        self.window = Some(messages);
        self
    }

    /// Builds the context for a session's persisted history.
    ///
    /// The policy instruction comes first, followed by the history in
    /// persistence order.
    #[must_use]
    pub fn build_context(&self, history: &[Message]) -> Vec<ChatMessage> {
        let start = self
            .window
            .map_or(0, |window| history.len().saturating_sub(window));

        std::iter::once(ChatMessage::system(POLICY_INSTRUCTION))
            .chain(history[start..].iter().map(Message::to_chat_message))
            .collect()
    }
}
