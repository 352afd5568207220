//! Conversation engine for the travel assistant.
//!
//! This crate provides:
//!
//! - **Session Manager**: one active session per user, explicit rollover
//! - **Context Assembler**: the message sequence sent to the model
//! - **Capability Registry**: the closed set of travel lookups
//! - **Turn Engine**: dispatch, reconciliation and persistence of each turn

pub mod capability;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod fallback;
pub mod lock;
pub mod message;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod summary;
pub mod turn;

#[cfg(test)]
mod testing;

pub use capability::{
    Capability, CapabilityArguments, CapabilityRegistry, CapabilityResult, ParameterKind,
    ParameterSpec,
};
pub use context::{ContextAssembler, POLICY_INSTRUCTION};
pub use dispatch::{CapabilityDispatcher, Decision, Execution};
pub use error::{CapabilityError, StoreError, SummaryError};
pub use fallback::Fallback;
pub use message::{Message, MessageRole};
pub use reconcile::{RESULTS_TEMPLATE_PREFIX, ResponseReconciler};
pub use session::{Session, SessionManager, SessionSummary};
pub use store::{ConversationStore, InMemoryConversationStore};
pub use summary::{ConversationSummary, EMPTY_SESSION_SUMMARY};
pub use turn::{TurnEngine, TurnFailure, TurnOutcome, TurnState};
