//! The turn engine.
//!
//! A turn takes one user message to exactly one persisted reply. Every path
//! through the state machine ends in reply text: a genuine answer, a
//! no-results notice, or a fixed apology. Faults are logged, never returned.

use crate::capability::CapabilityRegistry;
use crate::context::ContextAssembler;
use crate::dispatch::{CapabilityDispatcher, Decision, Execution};
use crate::error::{StoreError, SummaryError};
use crate::fallback::Fallback;
use crate::lock::KeyedLocks;
use crate::message::Message;
use crate::reconcile::ResponseReconciler;
use crate::session::{SessionManager, SessionSummary};
use crate::store::ConversationStore;
use crate::summary::{self, ConversationSummary};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, instrument, warn};
use travel_assistant_ai::LlmGateway;
use travel_assistant_core::{SessionId, UserId};
use travel_assistant_travel::TravelDataSource;

/// Infrastructure fault that failed a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnFailure {
    /// The conversation store could not be read or written.
    Store,
    /// The model could not be reached.
    Gateway,
}

impl fmt::Display for TurnFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store => write!(f, "store"),
            Self::Gateway => write!(f, "gateway"),
        }
    }
}

/// States of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnState {
    /// Waiting for the model to decide.
    AwaitingIntent,
    /// The model answered without a capability.
    DirectAnswer,
    /// A capability is running.
    CapabilityExecuting,
    /// The model is phrasing a capability result.
    Reconciling,
    /// The user message and reply are being saved.
    Persisting,
    /// The turn completed.
    Done,
    /// An infrastructure fault failed the turn.
    Failed(TurnFailure),
}

impl TurnState {
    /// Returns true if the turn can move from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(&self, next: TurnState) -> bool {
        use TurnState::{
            AwaitingIntent, CapabilityExecuting, DirectAnswer, Done, Failed, Persisting,
            Reconciling,
        };

        matches!(
            (self, next),
            (
                AwaitingIntent,
                DirectAnswer | CapabilityExecuting | Persisting | Failed(_)
            ) | (DirectAnswer, Persisting)
                | (CapabilityExecuting, Reconciling | Persisting)
                | (Reconciling, Persisting)
                | (Persisting, Done | Failed(_))
        )
    }

    /// Returns true for `Done` and `Failed`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingIntent => write!(f, "awaiting_intent"),
            Self::DirectAnswer => write!(f, "direct_answer"),
            Self::CapabilityExecuting => write!(f, "capability_executing"),
            Self::Reconciling => write!(f, "reconciling"),
            Self::Persisting => write!(f, "persisting"),
            Self::Done => write!(f, "done"),
            Self::Failed(failure) => write!(f, "failed({failure})"),
        }
    }
}

/// Result of one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// The session the turn ran in, if one could be resolved.
    pub session_id: Option<SessionId>,
    /// The reply shown to the user.
    pub reply: String,
    /// The terminal state.
    pub final_state: TurnState,
    /// Whether the user message and reply were saved.
    pub persisted: bool,
}

#[derive(Debug)]
struct TurnProgress {
    state: TurnState,
    failure: Option<TurnFailure>,
}

impl TurnProgress {
    fn new() -> Self {
        Self {
            state: TurnState::AwaitingIntent,
            failure: None,
        }
    }

    fn advance(&mut self, next: TurnState) {
        debug_assert!(!self.state.is_terminal(), "turn already finished in {}", self.state);
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid turn transition {} -> {next}",
            self.state
        );
        debug!(from = %self.state, to = %next, "turn transition");
        self.state = next;
    }

    fn fail(&mut self, failure: TurnFailure) {
        self.failure.get_or_insert(failure);
    }

    fn finish(&mut self) -> TurnState {
        let terminal = self.failure.map_or(TurnState::Done, TurnState::Failed);
        self.advance(terminal);
        terminal
    }
}

/// Runs conversation turns.
#[derive(Debug)]
pub struct TurnEngine<S, G, D> {
    sessions: SessionManager<S>,
    gateway: G,
    registry: CapabilityRegistry<D>,
    assembler: ContextAssembler,
    session_locks: KeyedLocks<SessionId>,
    turns: TaskTracker,
}

impl<S, G, D> TurnEngine<S, G, D>
where
    S: ConversationStore,
    G: LlmGateway,
    D: TravelDataSource,
{
    /// Creates an engine from its collaborators.
    pub fn new(store: S, gateway: G, data: D) -> Self {
        Self {
            sessions: SessionManager::new(store),
            gateway,
            registry: CapabilityRegistry::new(data),
            assembler: ContextAssembler::new(),
            session_locks: KeyedLocks::new(),
            turns: TaskTracker::new(),
        }
    }

    /// Limits the history sent to the model to the last `messages` messages.
    #[must_use]
    pub fn with_history_window(mut self, messages: usize) -> Self {
        self.assembler = self.assembler.with_window(messages);
        self
    }

    /// Processes one user message.
    ///
    /// Turns within one session are serialized; turns in different sessions
    /// run concurrently.
    #[instrument(skip(self, user_id, text), fields(user_id = %user_id))]
    pub async fn process_turn(&self, user_id: &UserId, text: &str) -> TurnOutcome {
        let mut progress = TurnProgress::new();

        let session_id = match self.sessions.resolve_active_session(user_id).await {
            Ok(session_id) => session_id,
            Err(e) => {
                error!(error = %e, "failed to resolve active session");
                progress.fail(TurnFailure::Store);
                return TurnOutcome {
                    session_id: None,
                    reply: Fallback::StoreUnavailable.text().to_string(),
                    final_state: progress.finish(),
                    persisted: false,
                };
            }
        };

        let _guard = self.session_locks.lock(session_id).await;
        let user_message = Message::user(user_id.clone(), text);

        let reply = self.reply(session_id, &user_message, &mut progress).await;

        progress.advance(TurnState::Persisting);
        let assistant_message = Message::assistant(user_id.clone(), reply);
        let reply = assistant_message.content.clone();
        let persisted = match self
            .sessions
            .persist_turn(session_id, user_message, assistant_message)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                error!(%session_id, error = %e, "failed to persist turn");
                progress.fail(TurnFailure::Store);
                false
            }
        };

        let final_state = progress.finish();
        if persisted {
            info!(%session_id, state = %final_state, "turn complete");
            TurnOutcome {
                session_id: Some(session_id),
                reply,
                final_state,
                persisted,
            }
        } else {
            TurnOutcome {
                session_id: Some(session_id),
                reply: Fallback::StoreUnavailable.text().to_string(),
                final_state,
                persisted,
            }
        }
    }

    async fn reply(
        &self,
        session_id: SessionId,
        user_message: &Message,
        progress: &mut TurnProgress,
    ) -> String {
        let history = match self.sessions.history(session_id).await {
            Ok(history) => history,
            Err(e) => {
                error!(%session_id, error = %e, "failed to load history");
                progress.fail(TurnFailure::Store);
                return Fallback::StoreUnavailable.text().to_string();
            }
        };

        let mut context = self.assembler.build_context(&history);
        context.push(user_message.to_chat_message());

        let dispatcher = CapabilityDispatcher::new(&self.gateway, &self.registry);
        let decision = match dispatcher.decide(&context).await {
            Ok(decision) => decision,
            Err(e) => {
                error!(%session_id, error = %e, "model unavailable");
                progress.fail(TurnFailure::Gateway);
                return Fallback::GatewayUnavailable.text().to_string();
            }
        };

        match decision {
            Decision::DirectAnswer(text) => {
                progress.advance(TurnState::DirectAnswer);
                text
            }
            Decision::Rejected(e) => Fallback::from(&e).text().to_string(),
            Decision::Invoke {
                capability,
                arguments,
            } => {
                progress.advance(TurnState::CapabilityExecuting);
                match dispatcher.execute(capability, &arguments).await {
                    Execution::Final(text) => text,
                    Execution::Found(raw) => {
                        progress.advance(TurnState::Reconciling);
                        ResponseReconciler::new(&self.gateway)
                            .reconcile(&context, capability.name(), &raw)
                            .await
                    }
                }
            }
        }
    }

    /// Starts a fresh session for the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn start_new_session(&self, user_id: &UserId) -> Result<SessionId, StoreError> {
        self.sessions.start_new_session(user_id).await
    }

    /// Returns the user's active session, if they have one.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn active_session(&self, user_id: &UserId) -> Result<Option<SessionId>, StoreError> {
        self.sessions.active_session(user_id).await
    }

    /// Returns a session's messages in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the session does not exist or cannot be read.
    pub async fn history(&self, session_id: SessionId) -> Result<Vec<Message>, StoreError> {
        self.sessions.history(session_id).await
    }

    /// Lists the user's sessions, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn list_sessions(&self, user_id: &UserId) -> Result<Vec<SessionSummary>, StoreError> {
        self.sessions.list_sessions(user_id).await
    }

    /// Summarizes a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be read or the model fails.
    pub async fn summarize(&self, session_id: SessionId) -> Result<ConversationSummary, SummaryError> {
        let history = self.sessions.history(session_id).await?;
        let summary = summary::summarize(&self.gateway, &history)
            .await
            .inspect_err(|e| warn!(%session_id, error = %e, "summary failed"))?;
        Ok(summary)
    }
}

impl<S, G, D> TurnEngine<S, G, D>
where
    S: ConversationStore + 'static,
    G: LlmGateway + 'static,
    D: TravelDataSource + 'static,
{
    /// Runs a turn on its own task.
    ///
    /// Dropping the handle does not cancel the turn; it still completes and is
    /// persisted.
    pub fn submit_turn(self: &Arc<Self>, user_id: UserId, text: String) -> JoinHandle<TurnOutcome> {
        let engine = Arc::clone(self);
        self.turns
            .spawn(async move { engine.process_turn(&user_id, &text).await })
    }

    /// Waits for every submitted turn to finish.
    ///
    /// Call before releasing the store so accepted turns can still persist.
    pub async fn drain(&self) {
        self.turns.close();
        if !self.turns.is_empty() {
            info!(in_flight = self.turns.len(), "waiting for in-flight turns");
        }
        self.turns.wait().await;
        self.turns.reopen();
    }
}
