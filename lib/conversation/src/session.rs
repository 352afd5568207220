//! Conversation session management.
//!
//! A user has at most one active session. Turns are appended to it until the
//! user explicitly starts a new one, which is the only way a session stops
//! being active.

use crate::error::StoreError;
use crate::lock::KeyedLocks;
use crate::message::Message;
use crate::store::ConversationStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use travel_assistant_core::{SessionId, UserId};

/// A conversation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: SessionId,
    /// The user who owns this session.
    pub user_id: UserId,
    /// Messages in this session, in persistence order.
    pub messages: Vec<Message>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last written.
    pub updated_at: DateTime<Utc>,
    /// Whether this is the user's current session.
    pub is_active: bool,
}

impl Session {
    /// Creates a new, empty, active session for a user.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            user_id,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
            is_active: true,
        }
    }

    /// Appends messages to the session.
    pub fn append(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
        self.updated_at = Utc::now();
    }

    /// Returns the number of messages.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Returns a summary of the session without its messages.
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            user_id: self.user_id.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            is_active: self.is_active,
            message_count: self.messages.len(),
        }
    }
}

/// Listing entry for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session identifier.
    pub id: SessionId,
    /// Owning user.
    pub user_id: UserId,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last written.
    pub updated_at: DateTime<Utc>,
    /// Whether this is the user's current session.
    pub is_active: bool,
    /// Number of persisted messages.
    pub message_count: usize,
}

/// Owns session activation and turn persistence on top of a store.
#[derive(Debug)]
pub struct SessionManager<S> {
    store: S,
    user_locks: KeyedLocks<UserId>,
}

impl<S: ConversationStore> SessionManager<S> {
    /// Creates a session manager over a store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            user_locks: KeyedLocks::new(),
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the user's active session, creating one if none exists.
    ///
    /// Serialized per user with [`Self::start_new_session`], so concurrent
    /// callers observe the same session.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub async fn resolve_active_session(&self, user_id: &UserId) -> Result<SessionId, StoreError> {
        let _guard = self.user_locks.lock(user_id.clone()).await;

        if let Some(session_id) = self.store.get_active_session(user_id).await? {
            debug!(%user_id, %session_id, "resolved active session");
            return Ok(session_id);
        }

        let session_id = self.store.create_and_activate_session(user_id).await?;
        info!(%user_id, %session_id, "created session");
        Ok(session_id)
    }

    /// Returns the user's active session without creating one.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn active_session(&self, user_id: &UserId) -> Result<Option<SessionId>, StoreError> {
        self.store.get_active_session(user_id).await
    }

    /// Deactivates the user's current session and activates a new empty one.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn start_new_session(&self, user_id: &UserId) -> Result<SessionId, StoreError> {
        let _guard = self.user_locks.lock(user_id.clone()).await;

        let session_id = self.store.create_and_activate_session(user_id).await?;
        info!(%user_id, %session_id, "started new session");
        Ok(session_id)
    }

    /// Appends a turn's user and assistant messages, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SessionNotFound`] if the session no longer exists.
    pub async fn persist_turn(
        &self,
        session_id: SessionId,
        user_message: Message,
        assistant_message: Message,
    ) -> Result<(), StoreError> {
        self.store
            .append_messages(session_id, vec![user_message, assistant_message])
            .await?;
        debug!(%session_id, "persisted turn");
        Ok(())
    }

    /// Returns a session's messages in persistence order.
    ///
    /// # Errors
    ///
    /// Returns an error if the session does not exist or cannot be read.
    pub async fn history(&self, session_id: SessionId) -> Result<Vec<Message>, StoreError> {
        self.store.load_messages(session_id).await
    }

    /// Lists the user's sessions, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn list_sessions(&self, user_id: &UserId) -> Result<Vec<SessionSummary>, StoreError> {
        self.store.list_sessions(user_id).await
    }
}
