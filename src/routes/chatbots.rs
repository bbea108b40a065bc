// ABOUTME: Chatbot registry route handlers
// ABOUTME: Create and list the chatbots whose indexes ground chat turns
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ragserve Project

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::{errors::AppError, resources::ServerResources};

/// Body of `POST /chatbots`
#[derive(Debug, Deserialize)]
pub struct CreateChatBotBody {
    /// Display name of the chatbot
    pub name: String,
}

/// Chatbot registry routes handler
pub struct ChatBotRoutes;

impl ChatBotRoutes {
    /// Create all chatbot routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/chatbots", post(Self::create_chat_bot))
            .route("/chatbots", get(Self::list_chat_bots))
            .with_state(resources)
    }

    /// Register a new chatbot
    async fn create_chat_bot(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<CreateChatBotBody>,
    ) -> Result<Json<Value>, AppError> {
        if body.name.trim().is_empty() {
            return Err(AppError::missing_field("name"));
        }

        let chat_bot = resources
            .database
            .chatbots()
            .create_chat_bot(body.name.trim())
            .await?;
        info!(chat_bot_id = %chat_bot.id, "Chatbot created");

        Ok(Json(json!({
            "success": true,
            "message": "Chatbot created successfully",
            "data": chat_bot,
        })))
    }

    /// List all registered chatbots
    async fn list_chat_bots(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Json<Value>, AppError> {
        let chat_bots = resources.database.chatbots().list_chat_bots().await?;
        let total = chat_bots.len();

        Ok(Json(json!({
            "success": true,
            "message": "Chatbots retrieved successfully",
            "data": chat_bots,
            "total": total,
        })))
    }
}
