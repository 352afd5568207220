//! Conversation summaries.

use crate::message::Message;
use serde::{Deserialize, Serialize};
use travel_assistant_ai::{ChatMessage, Completion, LlmError, LlmGateway};

/// Summary text for a session without messages.
pub const EMPTY_SESSION_SUMMARY: &str = "No messages available for this session.";

const SUMMARY_INSTRUCTION: &str = "Please summarize the following conversation:";
const ONE_LINER_PREFIX: &str = "Quick summary: ";
const ONE_LINER_CHARS: usize = 50;

/// A summary of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// The summary as produced.
    pub full_summary: String,
    /// Summary lines written as list items.
    pub bullet_points: Vec<String>,
    /// A truncated single-line version.
    pub one_liner: String,
}

impl ConversationSummary {
    /// Derives the bullet points and one-liner from summary text.
    #[must_use]
    pub fn from_text(full_summary: impl Into<String>) -> Self {
        let full_summary = full_summary.into();
        let bullet_points = full_summary
            .lines()
            .map(str::trim)
            .filter_map(|line| line.strip_prefix('-').or_else(|| line.strip_prefix('*')))
            .map(|point| point.trim().to_string())
            .filter(|point| !point.is_empty())
            .collect();
        let one_liner = format!(
            "{ONE_LINER_PREFIX}{}",
            full_summary.chars().take(ONE_LINER_CHARS).collect::<String>()
        );

        Self {
            full_summary,
            bullet_points,
            one_liner,
        }
    }
}

/// Summarizes a conversation with one model call.
///
/// An empty history is summarized without calling the model.
///
/// # Errors
///
/// Returns an error if the model cannot be reached or does not answer with
/// text.
pub async fn summarize<G: LlmGateway + ?Sized>(
    gateway: &G,
    history: &[Message],
) -> Result<ConversationSummary, LlmError> {
    if history.is_empty() {
        return Ok(ConversationSummary::from_text(EMPTY_SESSION_SUMMARY));
    }

    let transcript = history
        .iter()
        .map(|message| format!("{}: {}", message.role, message.content))
        .collect::<Vec<_>>()
        .join("\n");
    let messages = [
        ChatMessage::system(SUMMARY_INSTRUCTION),
        ChatMessage::user(transcript),
    ];

    match gateway.complete(&messages, None).await? {
        Completion::TextAnswer(text) => Ok(ConversationSummary::from_text(text)),
        Completion::CapabilityIntent { name, .. } => Err(LlmError::ResponseParseFailed {
            reason: format!("expected a summary, got a request for '{name}'"),
        }),
    }
}
