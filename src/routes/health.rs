// ABOUTME: Server-level liveness probe
// ABOUTME: Reports process health without touching external collaborators
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ragserve Project

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::resources::ServerResources;

/// Server health routes handler
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::health))
            .with_state(resources)
    }

    /// Liveness probe
    async fn health() -> Json<Value> {
        Json(json!({
            "status": "ok",
            "message": "Server is running",
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))
    }
}
