// ABOUTME: Chatbot registry persistence
// ABOUTME: CRUD over the chat_bots table with soft-delete filtering
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ragserve Project

use crate::errors::{AppError, AppResult};
use crate::models::{status, ChatBotRecord};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Chatbot database operations
#[derive(Debug, Clone)]
pub struct ChatBotStore {
    pool: SqlitePool,
}

impl ChatBotStore {
    /// Create a new store over the given pool
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a new chatbot
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn create_chat_bot(&self, name: &str) -> AppResult<ChatBotRecord> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO chat_bots (id, name, created_at, updated_at, status)
            VALUES ($1, $2, $3, $3, $4)
            ",
        )
        .bind(&id)
        .bind(name)
        .bind(&now)
        .bind(status::ACTIVE)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create chatbot: {e}")))?;

        Ok(ChatBotRecord {
            id,
            name: name.to_owned(),
            created_at: now.clone(),
            updated_at: now,
            status: status::ACTIVE.to_owned(),
        })
    }

    /// Get an active chatbot by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn get_chat_bot(&self, chat_bot_id: &str) -> AppResult<Option<ChatBotRecord>> {
        sqlx::query_as::<_, ChatBotRecord>(
            r"
            SELECT id, name, created_at, updated_at, status
            FROM chat_bots
            WHERE id = $1 AND status = 'active'
            ",
        )
        .bind(chat_bot_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get chatbot: {e}")))
    }

    /// List all active chatbots, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list_chat_bots(&self) -> AppResult<Vec<ChatBotRecord>> {
        sqlx::query_as::<_, ChatBotRecord>(
            r"
            SELECT id, name, created_at, updated_at, status
            FROM chat_bots
            WHERE status = 'active'
            ORDER BY created_at ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list chatbots: {e}")))
    }
}
