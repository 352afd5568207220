//! Conversation storage.
//!
//! The store is the only place cross-turn state lives: an append-only message
//! log per session plus the activity flag that marks a user's current session.

use crate::error::StoreError;
use crate::message::Message;
use crate::session::{Session, SessionSummary};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use travel_assistant_core::{SessionId, UserId};

/// Trait for conversation storage.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Returns the user's active session, if any.
    async fn get_active_session(&self, user_id: &UserId) -> Result<Option<SessionId>, StoreError>;

    /// Creates a new, empty, active session for the user.
    ///
    /// Every session previously active for the user is deactivated in the
    /// same atomic write.
    async fn create_and_activate_session(&self, user_id: &UserId) -> Result<SessionId, StoreError>;

    /// Appends messages to a session, preserving their order.
    ///
    /// Fails with [`StoreError::SessionNotFound`] rather than creating the
    /// session.
    async fn append_messages(
        &self,
        session_id: SessionId,
        messages: Vec<Message>,
    ) -> Result<(), StoreError>;

    /// Loads a session's messages in persistence order.
    async fn load_messages(&self, session_id: SessionId) -> Result<Vec<Message>, StoreError>;

    /// Lists the user's sessions, most recently updated first.
    async fn list_sessions(&self, user_id: &UserId) -> Result<Vec<SessionSummary>, StoreError>;
}

#[async_trait]
impl<T: ConversationStore + ?Sized> ConversationStore for Arc<T> {
    async fn get_active_session(&self, user_id: &UserId) -> Result<Option<SessionId>, StoreError> {
        (**self).get_active_session(user_id).await
    }

    async fn create_and_activate_session(&self, user_id: &UserId) -> Result<SessionId, StoreError> {
        (**self).create_and_activate_session(user_id).await
    }

    async fn append_messages(
        &self,
        session_id: SessionId,
        messages: Vec<Message>,
    ) -> Result<(), StoreError> {
        (**self).append_messages(session_id, messages).await
    }

    async fn load_messages(&self, session_id: SessionId) -> Result<Vec<Message>, StoreError> {
        (**self).load_messages(session_id).await
    }

    async fn list_sessions(&self, user_id: &UserId) -> Result<Vec<SessionSummary>, StoreError> {
        (**self).list_sessions(user_id).await
    }
}

/// In-memory conversation store.
///
/// All writes go through one lock, so deactivating the old session and
/// activating the new one can never be observed half-done.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemoryConversationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a full copy of a session.
    pub async fn session(&self, session_id: SessionId) -> Option<Session> {
        self.sessions.read().await.get(&session_id).cloned()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get_active_session(&self, user_id: &UserId) -> Result<Option<SessionId>, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .find(|session| session.is_active && &session.user_id == user_id)
            .map(|session| session.id))
    }

    async fn create_and_activate_session(&self, user_id: &UserId) -> Result<SessionId, StoreError> {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();

        for session in sessions
            .values_mut()
            .filter(|session| session.is_active && &session.user_id == user_id)
        {
            session.is_active = false;
            session.updated_at = now;
        }

        let session = Session::new(user_id.clone());
        let id = session.id;
        sessions.insert(id, session);
        Ok(id)
    }

    async fn append_messages(
        &self,
        session_id: SessionId,
        messages: Vec<Message>,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&session_id)
            .ok_or(StoreError::SessionNotFound { id: session_id })?;
        session.append(messages);
        Ok(())
    }

    async fn load_messages(&self, session_id: SessionId) -> Result<Vec<Message>, StoreError> {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .map(|session| session.messages.clone())
            .ok_or(StoreError::SessionNotFound { id: session_id })
    }

    async fn list_sessions(&self, user_id: &UserId) -> Result<Vec<SessionSummary>, StoreError> {
        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|session| &session.user_id == user_id)
            .map(Session::summary)
            .collect();
        summaries.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::from("u1")
    }

    #[tokio::test]
    async fn create_deactivates_previous_session() {
        let store = InMemoryConversationStore::new();
        let first = store.create_and_activate_session(&user()).await.expect("create");
        let second = store.create_and_activate_session(&user()).await.expect("create");

        assert_ne!(first, second);
        assert_eq!(store.get_active_session(&user()).await.expect("get"), Some(second));
        assert!(!store.session(first).await.expect("first").is_active);
    }

    #[tokio::test]
    async fn activation_is_scoped_to_user() {
        let store = InMemoryConversationStore::new();
        let mine = store.create_and_activate_session(&user()).await.expect("create");
        store
            .create_and_activate_session(&UserId::from("u2"))
            .await
            .expect("create");

        assert_eq!(store.get_active_session(&user()).await.expect("get"), Some(mine));
    }

    #[tokio::test]
    async fn append_preserves_order() {
        let store = InMemoryConversationStore::new();
        let id = store.create_and_activate_session(&user()).await.expect("create");

        store
            .append_messages(
                id,
                vec![Message::user(user(), "one"), Message::assistant(user(), "two")],
            )
            .await
            .expect("append");
        store
            .append_messages(id, vec![Message::user(user(), "three")])
            .await
            .expect("append");

        let contents: Vec<String> = store
            .load_messages(id)
            .await
            .expect("load")
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, ["one", "two", "three"]);
    }

    #[tokio::test]
    async fn append_to_unknown_session_fails() {
        let store = InMemoryConversationStore::new();
        let missing = SessionId::new();
        let err = store
            .append_messages(missing, vec![Message::user(user(), "hi")])
            .await
            .unwrap_err();

        assert_eq!(err, StoreError::SessionNotFound { id: missing });
        assert!(store.session(missing).await.is_none());
    }

    #[tokio::test]
    async fn list_sessions_newest_first() {
        let store = InMemoryConversationStore::new();
        let old = store.create_and_activate_session(&user()).await.expect("create");
        let new = store.create_and_activate_session(&user()).await.expect("create");
        store
            .append_messages(new, vec![Message::user(user(), "hi")])
            .await
            .expect("append");

        let sessions = store.list_sessions(&user()).await.expect("list");
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, new);
        assert_eq!(sessions[0].message_count, 1);
        assert_eq!(sessions[1].id, old);
        assert!(!sessions[1].is_active);
    }
}
