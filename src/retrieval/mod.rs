// ABOUTME: Context retrieval abstraction for grounding chat turns
// ABOUTME: Defines the pluggable document-search contract used by the orchestrator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ragserve Project

//! # Context Retrieval
//!
//! The contract a document store implements to supply grounding context for
//! a turn. Retrieval is best-effort: the orchestrator treats a failure here
//! as "no context available" and proceeds with generation, so implementors
//! surface failures as retrieval-unavailable errors rather than panicking
//! or retrying indefinitely.

mod elasticsearch;

pub use elasticsearch::ElasticsearchRetriever;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppResult;

/// One retrieved document chunk with its relevance score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Source file the chunk was ingested from
    pub file_path: String,
    /// Chunk text content
    pub text: String,
    /// Relevance score assigned by the search backend
    pub score: f32,
}

/// Document search backend for context assembly
#[async_trait]
pub trait ContextAssembler: Send + Sync {
    /// Backend identifier (e.g., "elasticsearch")
    fn name(&self) -> &'static str;

    /// Search the chatbot's document index for chunks relevant to a query
    ///
    /// Results are ordered by descending relevance, at most `limit` chunks.
    ///
    /// # Errors
    ///
    /// Returns a retrieval-unavailable error when the backend cannot be
    /// reached or the search fails.
    async fn gather(
        &self,
        chatbot_id: &str,
        query: &str,
        limit: usize,
    ) -> AppResult<Vec<RetrievedChunk>>;

    /// Check whether the backend is reachable
    ///
    /// # Errors
    ///
    /// Returns a retrieval-unavailable error when the backend cannot be
    /// reached.
    async fn ping(&self) -> AppResult<()>;
}
