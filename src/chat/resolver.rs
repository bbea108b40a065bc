// ABOUTME: Session/chat resolution for inbound turn requests
// ABOUTME: Maps optional identifiers to a concrete, persisted session/chat pair
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ragserve Project

use tracing::info;

use crate::database::ConversationStore;
use crate::errors::{AppError, AppResult};

/// Title assigned to chats created implicitly by a turn request
const DEFAULT_CHAT_TITLE: &str = "New Chat";

/// A resolved, persisted session/chat pair
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    /// Session the turn runs under
    pub session_id: String,
    /// Chat the turn runs under
    pub chat_id: String,
}

/// Resolves optional session/chat identifiers into a concrete pair
///
/// Resolution rules:
/// - neither supplied: create a fresh session and chat (never fails);
/// - session only: the session must exist and be active, a chat is created
///   under it;
/// - chat supplied: the chat must exist and be active, and when a session
///   was also supplied the chat must belong to it.
///
/// Created rows are persisted before returning, so the returned identifiers
/// are immediately resolvable by history reads.
#[derive(Debug, Clone)]
pub struct SessionChatResolver {
    store: ConversationStore,
}

impl SessionChatResolver {
    /// Create a resolver over the given store
    #[must_use]
    pub const fn new(store: ConversationStore) -> Self {
        Self { store }
    }

    /// Resolve `(session_id?, chat_id?)` to a concrete pair
    ///
    /// # Errors
    ///
    /// Returns a not-found error for a missing session or chat, and a
    /// conflict error when the chat belongs to a different session than the
    /// one supplied.
    pub async fn resolve(
        &self,
        session_id: Option<&str>,
        chat_id: Option<&str>,
    ) -> AppResult<ResolvedTarget> {
        if let Some(chat_id) = chat_id {
            return self.resolve_existing_chat(session_id, chat_id).await;
        }

        let session_id = match session_id {
            Some(session_id) => {
                self.store
                    .get_session(session_id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Session {session_id}")))?;
                session_id.to_owned()
            }
            None => {
                let session = self.store.create_session().await?;
                info!(session_id = %session.id, "Created new session");
                session.id
            }
        };

        let chat = self.store.create_chat(&session_id, DEFAULT_CHAT_TITLE).await?;
        info!(chat_id = %chat.id, %session_id, "Created new chat");

        Ok(ResolvedTarget {
            session_id,
            chat_id: chat.id,
        })
    }

    async fn resolve_existing_chat(
        &self,
        session_id: Option<&str>,
        chat_id: &str,
    ) -> AppResult<ResolvedTarget> {
        let chat = self
            .store
            .get_chat(chat_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Chat {chat_id}")))?;

        if let Some(session_id) = session_id {
            if chat.session_id != session_id {
                return Err(AppError::conflict(format!(
                    "Chat {chat_id} does not belong to session {session_id}"
                )));
            }
        }

        Ok(ResolvedTarget {
            session_id: chat.session_id,
            chat_id: chat.id,
        })
    }
}
