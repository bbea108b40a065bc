// ABOUTME: Main library entry point for the Ragserve chat backend
// ABOUTME: Exposes session/turn orchestration, retrieval, generation, and HTTP routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ragserve Project

#![deny(unsafe_code)]

//! # Ragserve
//!
//! A retrieval-augmented chat backend. Each turn resolves a session/chat
//! pair, reserves a strictly increasing sequence number for the exchange,
//! grounds the query in document fragments retrieved from the chatbot's
//! search index, generates a response with an LLM, and persists the full
//! exchange — optionally streaming fragments to the client over SSE as they
//! are generated.
//!
//! ## Architecture
//!
//! - **Database**: SQLite persistence for sessions, chats, conversations,
//!   and the chatbot registry
//! - **Chat**: the turn orchestrator, session/chat resolver, and streaming
//!   emitter
//! - **Retrieval**: pluggable document search (Elasticsearch)
//! - **LLM**: pluggable generation backends (Gemini)
//! - **Routes**: the axum HTTP surface
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use ragserve::config::ServerConfig;
//! use ragserve::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Ragserve configured with port: HTTP={}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Chat turn domain: resolution, orchestration, streaming events
pub mod chat;
/// Environment-based server configuration
pub mod config;
/// Database connection management and stores
pub mod database;
/// Unified error handling
pub mod errors;
/// LLM provider abstraction and implementations
pub mod llm;
/// Structured logging initialization
pub mod logging;
/// Persistence record types
pub mod models;
/// Shared server resources
pub mod resources;
/// Context retrieval abstraction and implementations
pub mod retrieval;
/// HTTP route handlers
pub mod routes;
