//! Error types for the conversation crate.
//!
//! - `StoreError`: Errors from the conversation store
//! - `CapabilityError`: Rejected capability intents (unknown name, bad arguments)
//! - `SummaryError`: Errors from conversation summarization

use std::fmt;
use travel_assistant_ai::LlmError;
use travel_assistant_core::SessionId;

/// Errors from conversation store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Session not found.
    SessionNotFound { id: SessionId },
    /// Storage operation failed.
    StorageFailed { reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionNotFound { id } => write!(f, "session not found: {id}"),
            Self::StorageFailed { reason } => {
                write!(f, "conversation storage failed: {reason}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Reasons a capability intent from the model is rejected before execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    /// The model named a capability that is not in the registry.
    UnknownCapability { name: String },
    /// The arguments are not a JSON object of the expected shape.
    MalformedArguments { capability: String, reason: String },
    /// A mandatory parameter is absent or blank.
    MissingParameter {
        capability: String,
        parameter: String,
    },
}

impl fmt::Display for CapabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCapability { name } => write!(f, "unknown capability: {name}"),
            Self::MalformedArguments { capability, reason } => {
                write!(f, "malformed arguments for '{capability}': {reason}")
            }
            Self::MissingParameter {
                capability,
                parameter,
            } => {
                write!(
                    f,
                    "missing mandatory parameter '{parameter}' for '{capability}'"
                )
            }
        }
    }
}

impl std::error::Error for CapabilityError {}

/// Errors from summarizing a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryError {
    /// The history could not be loaded.
    Store(StoreError),
    /// The model could not produce a summary.
    Gateway(LlmError),
}

impl fmt::Display for SummaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "summary history unavailable: {e}"),
            Self::Gateway(e) => write!(f, "summary generation failed: {e}"),
        }
    }
}

impl std::error::Error for SummaryError {}

impl From<StoreError> for SummaryError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<LlmError> for SummaryError {
    fn from(e: LlmError) -> Self {
        Self::Gateway(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        let err = StoreError::SessionNotFound {
            id: SessionId::new(),
        };
        assert!(err.to_string().contains("session not found"));
    }

    #[test]
    fn capability_error_display() {
        let err = CapabilityError::MissingParameter {
            capability: "get_hotels_info".to_string(),
            parameter: "city".to_string(),
        };
        assert!(err.to_string().contains("get_hotels_info"));
        assert!(err.to_string().contains("city"));
    }

    #[test]
    fn summary_error_wraps_sources() {
        let err: SummaryError = LlmError::Timeout.into();
        assert!(err.to_string().contains("timed out"));
    }
}
