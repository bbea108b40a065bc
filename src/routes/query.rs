// ABOUTME: Standalone retrieval query route handlers
// ABOUTME: Direct document search against a chatbot's index without a chat turn
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ragserve Project

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{errors::AppError, resources::ServerResources};

/// Query parameters of `GET /query`
#[derive(Debug, Deserialize)]
pub struct QueryParams {
    /// Chatbot whose index to search
    pub chatbot_id: String,
    /// Search text
    pub query: String,
    /// Maximum number of results (defaults to the configured context limit)
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Retrieval query routes handler
pub struct QueryRoutes;

impl QueryRoutes {
    /// Create all query routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/query", get(Self::query))
            .route("/query/health", get(Self::health))
            .with_state(resources)
    }

    /// Search a chatbot's document index
    ///
    /// Unlike during a chat turn, a retrieval failure here surfaces to the
    /// caller: the endpoint exists to inspect the index directly.
    async fn query(
        State(resources): State<Arc<ServerResources>>,
        Query(params): Query<QueryParams>,
    ) -> Result<Json<Value>, AppError> {
        if params.chatbot_id.trim().is_empty() {
            return Err(AppError::missing_field("chatbot_id"));
        }
        if params.query.trim().is_empty() {
            return Err(AppError::missing_field("query"));
        }

        let limit = params
            .limit
            .unwrap_or(resources.config.retrieval.context_limit);

        let results = resources
            .retriever
            .gather(&params.chatbot_id, &params.query, limit)
            .await?;
        let total_results = results.len();

        Ok(Json(json!({
            "success": true,
            "message": "Query processed successfully",
            "data": {
                "chatbot_id": params.chatbot_id,
                "query": params.query,
                "results": results,
                "total_results": total_results,
            }
        })))
    }

    /// Liveness probe for the query service
    async fn health() -> Json<Value> {
        Json(json!({
            "status": "ok",
            "message": "Query service is running",
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))
    }
}
