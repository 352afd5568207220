//! PostgreSQL conversation store.
//!
//! Sessions and messages live in `conversation_sessions` and
//! `conversation_messages`. A partial unique index guarantees at most one
//! active session per user; activation runs in a single transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use tracing::debug;
use travel_assistant_conversation::{
    ConversationStore, Message, MessageRole, SessionSummary, StoreError,
};
use travel_assistant_core::{MessageId, SessionId, UserId};

fn storage_failed(e: sqlx::Error) -> StoreError {
    StoreError::StorageFailed {
        reason: e.to_string(),
    }
}

fn invalid_data(what: &str, value: &str, reason: impl std::fmt::Display) -> StoreError {
    StoreError::StorageFailed {
        reason: format!("invalid {what} '{value}': {reason}"),
    }
}

/// Row type for message queries.
#[derive(FromRow)]
struct MessageRow {
    id: String,
    role: String,
    content: String,
    user_id: String,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    fn try_into_message(self) -> Result<Message, StoreError> {
        let id = MessageId::from_str(&self.id).map_err(|e| invalid_data("message id", &self.id, e))?;
        let role = MessageRole::from_str(&self.role).map_err(|e| invalid_data("role", &self.role, e))?;

        Ok(Message {
            id,
            role,
            content: self.content,
            user_id: UserId::new(self.user_id),
            timestamp: self.created_at,
        })
    }
}

/// Row type for session listings.
#[derive(FromRow)]
struct SessionSummaryRow {
    id: String,
    user_id: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    message_count: i64,
}

impl SessionSummaryRow {
    fn try_into_summary(self) -> Result<SessionSummary, StoreError> {
        let id = SessionId::from_str(&self.id).map_err(|e| invalid_data("session id", &self.id, e))?;

        Ok(SessionSummary {
            id,
            user_id: UserId::new(self.user_id),
            created_at: self.created_at,
            updated_at: self.updated_at,
            is_active: self.is_active,
            message_count: usize::try_from(self.message_count).unwrap_or_default(),
        })
    }
}

/// Conversation store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgConversationStore {
    pool: PgPool,
}

impl PgConversationStore {
    /// Creates a new store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn session_exists(&self, session_id: SessionId) -> Result<bool, StoreError> {
        sqlx::query_scalar(r#"SELECT EXISTS (SELECT 1 FROM conversation_sessions WHERE id = $1)"#)
            .bind(session_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(storage_failed)
    }
}

#[async_trait]
impl ConversationStore for PgConversationStore {
    async fn get_active_session(&self, user_id: &UserId) -> Result<Option<SessionId>, StoreError> {
        let id: Option<String> = sqlx::query_scalar(
            r#"
            SELECT id FROM conversation_sessions
            WHERE user_id = $1 AND is_active
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_failed)?;

        id.map(|id| SessionId::from_str(&id).map_err(|e| invalid_data("session id", &id, e)))
            .transpose()
    }

    async fn create_and_activate_session(&self, user_id: &UserId) -> Result<SessionId, StoreError> {
        let session_id = SessionId::new();
        let mut tx = self.pool.begin().await.map_err(storage_failed)?;

        sqlx::query(
            r#"
            UPDATE conversation_sessions
            SET is_active = FALSE, updated_at = NOW()
            WHERE user_id = $1 AND is_active
            "#,
        )
        .bind(user_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(storage_failed)?;

        sqlx::query(
            r#"
            INSERT INTO conversation_sessions (id, user_id, is_active, created_at, updated_at)
            VALUES ($1, $2, TRUE, NOW(), NOW())
            "#,
        )
        .bind(session_id.to_string())
        .bind(user_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(storage_failed)?;

        tx.commit().await.map_err(storage_failed)?;
        debug!(%user_id, %session_id, "activated session");
        Ok(session_id)
    }

    async fn append_messages(
        &self,
        session_id: SessionId,
        messages: Vec<Message>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(storage_failed)?;

        let touched = sqlx::query(
            r#"
            UPDATE conversation_sessions SET updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(session_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(storage_failed)?;

        if touched.rows_affected() == 0 {
            return Err(StoreError::SessionNotFound { id: session_id });
        }

        for message in messages {
            sqlx::query(
                r#"
                INSERT INTO conversation_messages (id, session_id, role, content, user_id, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(message.id.to_string())
            .bind(session_id.to_string())
            .bind(message.role.as_str())
            .bind(&message.content)
            .bind(message.user_id.as_str())
            .bind(message.timestamp)
            .execute(&mut *tx)
            .await
            .map_err(storage_failed)?;
        }

        tx.commit().await.map_err(storage_failed)
    }

    async fn load_messages(&self, session_id: SessionId) -> Result<Vec<Message>, StoreError> {
        if !self.session_exists(session_id).await? {
            return Err(StoreError::SessionNotFound { id: session_id });
        }

        let rows: Vec<MessageRow> = sqlx::query_as(
            r#"
            SELECT id, role, content, user_id, created_at
            FROM conversation_messages
            WHERE session_id = $1
            ORDER BY seq
            "#,
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_failed)?;

        rows.into_iter().map(MessageRow::try_into_message).collect()
    }

    async fn list_sessions(&self, user_id: &UserId) -> Result<Vec<SessionSummary>, StoreError> {
        let rows: Vec<SessionSummaryRow> = sqlx::query_as(
            r#"
            SELECT
                s.id,
                s.user_id,
                s.is_active,
                s.created_at,
                s.updated_at,
                COUNT(m.seq) AS message_count
            FROM conversation_sessions s
            LEFT JOIN conversation_messages m ON m.session_id = s.id
            WHERE s.user_id = $1
            GROUP BY s.id
            ORDER BY s.updated_at DESC, s.id DESC
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_failed)?;

        rows.into_iter().map(SessionSummaryRow::try_into_summary).collect()
    }
}
