// ABOUTME: Persistent record types for sessions, chats, conversations, and chatbots
// ABOUTME: String UUIDs and RFC 3339 timestamps, matching the SQLite schema
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ragserve Project

//! Database record types shared across the store and the HTTP surface.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row status constants for soft deletion
pub mod status {
    /// Live row, visible to all reads
    pub const ACTIVE: &str = "active";
    /// Soft-deleted row, filtered from all reads
    pub const DELETED: &str = "deleted";
}

/// A grouping of related chats over time
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionRecord {
    /// Unique session ID (UUID v4)
    pub id: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last update timestamp (RFC 3339)
    pub updated_at: String,
    /// Row status (`active` or `deleted`)
    pub status: String,
}

/// One conversational thread inside a session
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatRecord {
    /// Unique chat ID (UUID v4)
    pub id: String,
    /// Owning session; never changes after creation
    pub session_id: String,
    /// Chat title
    pub title: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last update timestamp (RFC 3339)
    pub updated_at: String,
    /// Row status (`active` or `deleted`)
    pub status: String,
}

/// One user-to-bot exchange (a turn)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConversationRecord {
    /// Unique conversation ID (UUID v4)
    pub id: String,
    /// Denormalized owning session; the chat's session_id is authoritative
    pub session_id: String,
    /// Owning chat
    pub chat_id: String,
    /// 1-based, strictly increasing per chat
    pub sequence_number: i64,
    /// The user's query for this turn
    pub user_query: String,
    /// Set exactly once at turn completion; null for reserved/aborted turns
    pub bot_response: Option<String>,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last update timestamp (RFC 3339)
    pub updated_at: String,
    /// Row status (`active` or `deleted`)
    pub status: String,
}

/// A registered chatbot whose knowledge index backs retrieval
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatBotRecord {
    /// Unique chatbot ID (UUID v4)
    pub id: String,
    /// Display name
    pub name: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last update timestamp (RFC 3339)
    pub updated_at: String,
    /// Row status (`active` or `deleted`)
    pub status: String,
}
