// ABOUTME: Database connection management and schema migrations
// ABOUTME: SQLite pool setup with foreign-key enforcement and embedded migrations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ragserve Project

//! # Database Layer
//!
//! [`Database`] owns the SQLite connection pool and runs the embedded
//! migrations at startup. Store types ([`ConversationStore`],
//! [`ChatBotStore`]) borrow the pool for their operations.

pub mod chatbots;
pub mod conversations;

pub use chatbots::ChatBotStore;
pub use conversations::ConversationStore;

use crate::errors::{AppError, AppResult};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use tracing::info;

/// Database handle wrapping the SQLite pool
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database and run pending migrations
    ///
    /// Foreign keys are enabled on every connection so session → chat →
    /// conversation cascade deletes apply. In-memory databases are pinned to
    /// a single connection because each SQLite `:memory:` connection is an
    /// independent database.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails, or a
    /// migration fails to apply.
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::config(format!("Invalid database URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);

        let max_connections = if database_url.contains(":memory:") {
            1
        } else {
            5
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect: {e}")))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::database(format!("Migration failed: {e}")))?;

        info!("Database ready at {database_url}");

        Ok(Self { pool })
    }

    /// Access the underlying connection pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create a conversation store over this database
    #[must_use]
    pub fn conversations(&self) -> ConversationStore {
        ConversationStore::new(self.pool.clone())
    }

    /// Create a chatbot store over this database
    #[must_use]
    pub fn chatbots(&self) -> ChatBotStore {
        ChatBotStore::new(self.pool.clone())
    }
}
