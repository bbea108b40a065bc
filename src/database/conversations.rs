// ABOUTME: Conversation store: sessions, chats, and per-turn conversation rows
// ABOUTME: Atomic sequence-number reservation with bounded retry on unique conflicts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ragserve Project

//! # Conversation Store
//!
//! Persistence contract for the chat domain. All cross-request coordination
//! happens through the `UNIQUE (chat_id, sequence_number)` constraint:
//! [`ConversationStore::reserve_conversation`] computes the next sequence
//! number and inserts it, retrying a bounded number of times when a
//! concurrent turn on the same chat wins the race.

use crate::errors::{AppError, AppResult};
use crate::models::{status, ChatRecord, ConversationRecord, SessionRecord};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

/// Reservation attempts before a sequence race is surfaced as a conflict
const SEQUENCE_RETRY_ATTEMPTS: u32 = 3;

/// Conversation database operations
#[derive(Debug, Clone)]
pub struct ConversationStore {
    pool: SqlitePool,
}

impl ConversationStore {
    /// Create a new store over the given pool
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // Session Operations
    // ========================================================================

    /// Create a new session
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn create_session(&self) -> AppResult<SessionRecord> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO sessions (id, created_at, updated_at, status)
            VALUES ($1, $2, $2, $3)
            ",
        )
        .bind(&id)
        .bind(&now)
        .bind(status::ACTIVE)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create session: {e}")))?;

        Ok(SessionRecord {
            id,
            created_at: now.clone(),
            updated_at: now,
            status: status::ACTIVE.to_owned(),
        })
    }

    /// Get an active session by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn get_session(&self, session_id: &str) -> AppResult<Option<SessionRecord>> {
        sqlx::query_as::<_, SessionRecord>(
            r"
            SELECT id, created_at, updated_at, status
            FROM sessions
            WHERE id = $1 AND status = 'active'
            ",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get session: {e}")))
    }

    // ========================================================================
    // Chat Operations
    // ========================================================================

    /// Create a new chat under an existing session
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails (including a
    /// foreign-key violation for a missing session).
    pub async fn create_chat(&self, session_id: &str, title: &str) -> AppResult<ChatRecord> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO chats (id, session_id, title, created_at, updated_at, status)
            VALUES ($1, $2, $3, $4, $4, $5)
            ",
        )
        .bind(&id)
        .bind(session_id)
        .bind(title)
        .bind(&now)
        .bind(status::ACTIVE)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create chat: {e}")))?;

        Ok(ChatRecord {
            id,
            session_id: session_id.to_owned(),
            title: title.to_owned(),
            created_at: now.clone(),
            updated_at: now,
            status: status::ACTIVE.to_owned(),
        })
    }

    /// Get an active chat by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn get_chat(&self, chat_id: &str) -> AppResult<Option<ChatRecord>> {
        sqlx::query_as::<_, ChatRecord>(
            r"
            SELECT id, session_id, title, created_at, updated_at, status
            FROM chats
            WHERE id = $1 AND status = 'active'
            ",
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get chat: {e}")))
    }

    // ========================================================================
    // Conversation Operations
    // ========================================================================

    /// Reserve the next turn for a chat
    ///
    /// Computes `MAX(sequence_number) + 1` and inserts the row with a null
    /// `bot_response`. Two concurrent reservations on the same chat cannot
    /// receive the same sequence number: the loser of the unique-constraint
    /// race recomputes and retries.
    ///
    /// # Errors
    ///
    /// Returns a conflict error if the race is lost `SEQUENCE_RETRY_ATTEMPTS`
    /// times in a row, or a database error for any other failure.
    pub async fn reserve_conversation(
        &self,
        session_id: &str,
        chat_id: &str,
        user_query: &str,
    ) -> AppResult<ConversationRecord> {
        for attempt in 0..SEQUENCE_RETRY_ATTEMPTS {
            let next_sequence: i64 = sqlx::query_scalar(
                r"
                SELECT COALESCE(MAX(sequence_number), 0) + 1
                FROM conversations
                WHERE chat_id = $1
                ",
            )
            .bind(chat_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to compute sequence number: {e}")))?;

            let id = Uuid::new_v4().to_string();
            let now = chrono::Utc::now().to_rfc3339();

            let result = sqlx::query(
                r"
                INSERT INTO conversations
                    (id, session_id, chat_id, sequence_number, user_query, created_at, updated_at, status)
                VALUES ($1, $2, $3, $4, $5, $6, $6, $7)
                ",
            )
            .bind(&id)
            .bind(session_id)
            .bind(chat_id)
            .bind(next_sequence)
            .bind(user_query)
            .bind(&now)
            .bind(status::ACTIVE)
            .execute(&self.pool)
            .await;

            match result {
                Ok(_) => {
                    return Ok(ConversationRecord {
                        id,
                        session_id: session_id.to_owned(),
                        chat_id: chat_id.to_owned(),
                        sequence_number: next_sequence,
                        user_query: user_query.to_owned(),
                        bot_response: None,
                        created_at: now.clone(),
                        updated_at: now,
                        status: status::ACTIVE.to_owned(),
                    });
                }
                Err(e) if is_unique_violation(&e) => {
                    debug!(
                        chat_id,
                        attempt, "Sequence reservation lost race, retrying"
                    );
                }
                Err(e) => {
                    return Err(AppError::database(format!(
                        "Failed to reserve conversation: {e}"
                    )));
                }
            }
        }

        Err(AppError::conflict(format!(
            "Could not reserve a turn for chat {chat_id} after {SEQUENCE_RETRY_ATTEMPTS} attempts"
        )))
    }

    /// Finalize a reserved turn with the full response text
    ///
    /// The response is written exactly once: a second finalize of the same
    /// conversation is rejected.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the conversation does not exist, was
    /// soft-deleted, or was already finalized.
    pub async fn finalize_conversation(
        &self,
        conversation_id: &str,
        bot_response: &str,
    ) -> AppResult<ConversationRecord> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r"
            UPDATE conversations
            SET bot_response = $1, updated_at = $2
            WHERE id = $3 AND status = 'active' AND bot_response IS NULL
            ",
        )
        .bind(bot_response)
        .bind(&now)
        .bind(conversation_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to finalize conversation: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Unfinalized conversation {conversation_id}"
            )));
        }

        self.get_conversation(conversation_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Conversation {conversation_id}")))
    }

    /// Get an active conversation by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn get_conversation(
        &self,
        conversation_id: &str,
    ) -> AppResult<Option<ConversationRecord>> {
        sqlx::query_as::<_, ConversationRecord>(
            r"
            SELECT id, session_id, chat_id, sequence_number, user_query, bot_response,
                   created_at, updated_at, status
            FROM conversations
            WHERE id = $1 AND status = 'active'
            ",
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get conversation: {e}")))
    }

    /// List all active conversations of a chat, ascending by sequence number
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list_conversations(&self, chat_id: &str) -> AppResult<Vec<ConversationRecord>> {
        sqlx::query_as::<_, ConversationRecord>(
            r"
            SELECT id, session_id, chat_id, sequence_number, user_query, bot_response,
                   created_at, updated_at, status
            FROM conversations
            WHERE chat_id = $1 AND status = 'active'
            ORDER BY sequence_number ASC
            ",
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list conversations: {e}")))
    }

    /// Last `limit` conversations of a chat, returned ascending by sequence
    /// number (conversational-memory window)
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list_recent_conversations(
        &self,
        chat_id: &str,
        limit: i64,
    ) -> AppResult<Vec<ConversationRecord>> {
        let mut conversations = sqlx::query_as::<_, ConversationRecord>(
            r"
            SELECT id, session_id, chat_id, sequence_number, user_query, bot_response,
                   created_at, updated_at, status
            FROM conversations
            WHERE chat_id = $1 AND status = 'active'
            ORDER BY sequence_number DESC
            LIMIT $2
            ",
        )
        .bind(chat_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list recent conversations: {e}")))?;

        conversations.reverse();
        Ok(conversations)
    }
}

/// Check whether a sqlx error is a unique-constraint violation
fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Database(db) if db.kind() == sqlx::error::ErrorKind::UniqueViolation
    )
}
