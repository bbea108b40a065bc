// ABOUTME: Chat route handlers for session, turn, streaming, and history endpoints
// ABOUTME: Wraps the turn orchestrator behind the standard response envelope
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ragserve Project

//! Chat routes
//!
//! The turn endpoints (`/chat`, `/chat/stream`) accept an optional
//! session/chat pair and resolve it through the orchestrator. Single-shot
//! turns run on a detached task so a client disconnect never leaves a
//! half-finished conversation row; streaming turns get the same guarantee
//! from the orchestrator itself.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{Query, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures_util::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{
    chat::{TurnOutcome, TurnRequest},
    errors::AppError,
    resources::ServerResources,
};

// ============================================================================
// Request Types
// ============================================================================

/// Body of `POST /chat` and `POST /chat/stream`
#[derive(Debug, Deserialize)]
pub struct ChatTurnBody {
    /// Chatbot whose document index grounds the turn
    pub chatbot_id: String,
    /// User query text
    pub query: String,
    /// Existing session to continue, if any
    #[serde(default)]
    pub session_id: Option<String>,
    /// Existing chat to continue, if any
    #[serde(default)]
    pub chat_id: Option<String>,
}

impl From<ChatTurnBody> for TurnRequest {
    fn from(body: ChatTurnBody) -> Self {
        Self {
            chatbot_id: body.chatbot_id,
            query: body.query,
            session_id: body.session_id,
            chat_id: body.chat_id,
        }
    }
}

/// Query parameters of `GET /chat/history`
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    /// Chat whose conversations to list
    pub chat_id: String,
}

// ============================================================================
// Chat Routes
// ============================================================================

/// Chat routes handler
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create all chat routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/chat", post(Self::chat_turn))
            .route("/chat/stream", post(Self::chat_turn_stream))
            .route("/chat/session", post(Self::create_session))
            .route("/chat/history", get(Self::chat_history))
            .route("/chat/health", get(Self::health))
            .with_state(resources)
    }

    /// Run a single-shot turn and return the full response
    async fn chat_turn(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<ChatTurnBody>,
    ) -> Result<Response, AppError> {
        let orchestrator = Arc::clone(&resources.orchestrator);
        let request = TurnRequest::from(body);

        // Detached so a client disconnect cannot cancel the turn mid-write.
        let outcome = tokio::spawn(async move { orchestrator.run(request).await })
            .await
            .map_err(|e| AppError::internal(format!("Turn task failed: {e}")))??;

        Ok(Json(Self::turn_envelope(&outcome)).into_response())
    }

    /// Run a streaming turn, emitting SSE events until the terminal event
    async fn chat_turn_stream(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<ChatTurnBody>,
    ) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
        let orchestrator = Arc::clone(&resources.orchestrator);

        // Reservation failures surface here as an HTTP error; once the
        // receiver exists, all failures travel in-band as terminal events.
        let mut receiver = orchestrator.run_stream(TurnRequest::from(body)).await?;

        let stream = async_stream::stream! {
            while let Some(event) = receiver.recv().await {
                let is_final = event.is_final;
                match serde_json::to_string(&event) {
                    Ok(payload) => yield Ok(Event::default().data(payload)),
                    Err(e) => warn!(error = %e, "Failed to serialize turn event"),
                }
                if is_final {
                    break;
                }
            }
        };

        Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
    }

    /// Create a new session explicitly
    async fn create_session(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Json<Value>, AppError> {
        let session = resources.database.conversations().create_session().await?;
        info!(session_id = %session.id, "Session created");

        Ok(Json(json!({
            "success": true,
            "message": "Session created successfully",
            "data": {
                "session_id": session.id,
                "created_at": session.created_at,
            }
        })))
    }

    /// List a chat's conversations ordered by sequence number
    async fn chat_history(
        State(resources): State<Arc<ServerResources>>,
        Query(params): Query<HistoryParams>,
    ) -> Result<Json<Value>, AppError> {
        let store = resources.database.conversations();

        store
            .get_chat(&params.chat_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Chat {}", params.chat_id)))?;

        let conversations = store.list_conversations(&params.chat_id).await?;
        let count = conversations.len();

        let entries: Vec<Value> = conversations
            .iter()
            .map(|conv| {
                json!({
                    "id": conv.id,
                    "sequence_number": conv.sequence_number,
                    "user_query": conv.user_query,
                    "bot_response": conv.bot_response,
                    "created_at": conv.created_at,
                })
            })
            .collect();

        Ok(Json(json!({
            "success": true,
            "message": "Chat history retrieved successfully",
            "data": {
                "chat_id": params.chat_id,
                "conversations": entries,
                "count": count,
            }
        })))
    }

    /// Liveness probe for the chat service
    async fn health() -> Json<Value> {
        Json(json!({
            "status": "ok",
            "message": "Chat service is running",
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))
    }

    /// Success envelope for a completed turn
    fn turn_envelope(outcome: &TurnOutcome) -> Value {
        json!({
            "success": true,
            "message": "Chat request processed successfully",
            "data": {
                "session_id": outcome.session_id,
                "chat_id": outcome.chat_id,
                "conversation_id": outcome.conversation_id,
                "user_query": outcome.user_query,
                "bot_response": outcome.bot_response,
                "context_used": outcome.context_used,
            }
        })
    }
}
