// ABOUTME: Shared server resources container passed to all route handlers
// ABOUTME: Centralizes database, retrieval, and LLM handles behind one Arc
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ragserve Project

//! # Server Resources
//!
//! Single container for everything route handlers need. Constructed once at
//! startup and shared via `Arc<ServerResources>` so handlers clone one
//! pointer instead of threading individual handles.

use std::sync::Arc;

use crate::chat::TurnOrchestrator;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::llm::LlmProvider;
use crate::retrieval::ContextAssembler;

/// Centralized container for shared server dependencies
pub struct ServerResources {
    /// Database handle
    pub database: Arc<Database>,
    /// Context retrieval backend
    pub retriever: Arc<dyn ContextAssembler>,
    /// Generation backend
    pub llm: Arc<dyn LlmProvider>,
    /// Turn orchestrator over the above
    pub orchestrator: Arc<TurnOrchestrator>,
    /// Server configuration
    pub config: ServerConfig,
}

impl ServerResources {
    /// Assemble resources from their parts
    #[must_use]
    pub fn new(
        database: Arc<Database>,
        retriever: Arc<dyn ContextAssembler>,
        llm: Arc<dyn LlmProvider>,
        config: ServerConfig,
    ) -> Self {
        let orchestrator = Arc::new(TurnOrchestrator::new(
            database.conversations(),
            Arc::clone(&retriever),
            Arc::clone(&llm),
            config.retrieval.context_limit,
        ));

        Self {
            database,
            retriever,
            llm,
            orchestrator,
            config,
        }
    }
}

impl std::fmt::Debug for ServerResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerResources")
            .field("retriever", &self.retriever.name())
            .field("llm", &self.llm.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
