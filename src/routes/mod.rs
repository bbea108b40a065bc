// ABOUTME: HTTP route registration for the server
// ABOUTME: Merges chat, chatbot, query, and health routers over shared resources
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ragserve Project

//! # HTTP Routes
//!
//! Route modules follow one pattern: a unit struct with a `routes`
//! constructor taking `Arc<ServerResources>` and returning an axum
//! [`Router`]. [`router`] merges them into the full application surface.

pub mod chat;
pub mod chatbots;
pub mod health;
pub mod query;

use std::sync::Arc;

use axum::Router;

use crate::resources::ServerResources;

pub use chat::ChatRoutes;
pub use chatbots::ChatBotRoutes;
pub use health::HealthRoutes;
pub use query::QueryRoutes;

/// Build the complete application router
#[must_use]
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(ChatRoutes::routes(Arc::clone(&resources)))
        .merge(ChatBotRoutes::routes(Arc::clone(&resources)))
        .merge(QueryRoutes::routes(Arc::clone(&resources)))
        .merge(HealthRoutes::routes(resources))
}
